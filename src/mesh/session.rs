//! 登录会话

use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::time::Instant;

/// 一次成功登录得到的会话，只归属于单个 worker
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// 登录时刻（单调时钟，用于判断是否过期）
    pub last_login: Instant,
    /// 登录时刻（墙上时间，用于日志）
    pub logged_in_at: DateTime<Local>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            last_login: Instant::now(),
            logged_in_at: Local::now(),
        }
    }

    /// 距上次登录的时长
    pub fn age(&self) -> Duration {
        self.last_login.elapsed()
    }

    /// token 是否已超过可信时长
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }

    /// Authorization 头的值
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
