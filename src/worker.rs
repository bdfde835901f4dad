//! 账号会话 worker
//!
//! 每个分配结果对应一个 worker，循环执行：
//! 1. token 超过可信时长则重新登录
//! 2. 依次在每条线路上发送心跳并查询积分
//! 3. 固定间隔休眠
//!
//! 登录失败按指数退避重试，可配置最大次数；收到关闭信号时在下一个等待点退出。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::mesh::error::AuthError;
use crate::mesh::model::credentials::Credential;
use crate::mesh::provider::RewardsApi;
use crate::mesh::session::Session;
use crate::points_log::PointsSink;

/// 登录重试策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 第一次失败后的等待时间
    pub base: Duration,
    /// 等待时间上限
    pub max: Duration,
    /// 连续失败多少次后放弃，None 表示无限重试
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

/// worker 运行参数
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// 两轮心跳之间的间隔
    pub keepalive_interval: Duration,
    /// token 可信时长，超过后重新登录
    pub relogin_after: Duration,
    pub login_retry: RetryPolicy,
}

/// worker 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// 收到关闭信号
    Cancelled,
    /// 登录重试次数耗尽
    GaveUp,
}

/// 单个账号的会话 worker
pub struct AccountWorker<A> {
    credential: Credential,
    routes: Vec<A>,
    settings: WorkerSettings,
    sink: Option<PointsSink>,
    cancel: CancellationToken,
    /// 下一次登录使用的线路
    login_cursor: usize,
}

impl<A: RewardsApi> AccountWorker<A> {
    /// 创建 worker，`routes` 不能为空
    pub fn new(
        credential: Credential,
        routes: Vec<A>,
        settings: WorkerSettings,
        sink: Option<PointsSink>,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        if routes.is_empty() {
            anyhow::bail!("账号 {} 没有可用线路", credential.email);
        }
        Ok(Self {
            credential,
            routes,
            settings,
            sink,
            cancel,
            login_cursor: 0,
        })
    }

    /// 运行直到收到关闭信号或登录重试耗尽
    pub async fn run(mut self) -> WorkerExit {
        tracing::info!(
            account = %self.credential.email,
            routes = self.routes.len(),
            "worker 启动"
        );

        let mut session = match self.login_with_retry().await {
            Ok(session) => session,
            Err(exit) => return exit,
        };

        loop {
            if session.is_stale(self.settings.relogin_after) {
                tracing::info!(
                    account = %self.credential.email,
                    age_secs = session.age().as_secs(),
                    "token 已过期，重新登录"
                );
                session = match self.login_with_retry().await {
                    Ok(session) => session,
                    Err(exit) => return exit,
                };
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return WorkerExit::Cancelled,
                _ = self.run_cycle(&session) => {}
            }

            if !self.pause(self.settings.keepalive_interval).await {
                return WorkerExit::Cancelled;
            }
        }
    }

    /// 登录，失败时按退避策略轮换线路重试
    async fn login_with_retry(&mut self) -> Result<Session, WorkerExit> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let route = &self.routes[self.login_cursor % self.routes.len()];
            self.login_cursor = self.login_cursor.wrapping_add(1);

            let result: Result<Session, AuthError> = tokio::select! {
                _ = self.cancel.cancelled() => return Err(WorkerExit::Cancelled),
                result = route.login(&self.credential) => result,
            };

            match result {
                Ok(session) => {
                    tracing::info!(
                        account = %self.credential.email,
                        proxy = %route.route(),
                        at = %session.logged_in_at.format("%Y-%m-%d %H:%M:%S"),
                        "登录成功"
                    );
                    return Ok(session);
                }
                Err(e) => {
                    if self.settings.login_retry.exhausted(attempt) {
                        tracing::error!(
                            account = %self.credential.email,
                            proxy = %route.route(),
                            attempts = attempt,
                            "登录失败，放弃该账号: {}",
                            e
                        );
                        return Err(WorkerExit::GaveUp);
                    }

                    let delay = self.settings.login_retry.delay(attempt);
                    tracing::error!(
                        account = %self.credential.email,
                        proxy = %route.route(),
                        attempt,
                        retry_in_secs = delay.as_secs(),
                        "登录失败: {}",
                        e
                    );
                    if !self.pause(delay).await {
                        return Err(WorkerExit::Cancelled);
                    }
                }
            }
        }
    }

    /// 每条线路各执行一次心跳与积分查询
    async fn run_cycle(&self, session: &Session) {
        for route in &self.routes {
            let proxy = route.route();

            match route.keep_alive(session, &self.credential).await {
                Ok(()) => {
                    tracing::debug!(account = %self.credential.email, proxy = %proxy, "心跳成功");
                }
                Err(e) => {
                    tracing::warn!(account = %self.credential.email, proxy = %proxy, "心跳失败: {}", e);
                }
            }

            match route.fetch_points(session, &self.credential).await {
                Ok(record) => {
                    tracing::info!(
                        account = %record.email,
                        proxy = %proxy,
                        points = record.points,
                        last_keep_alive = record.last_keep_alive.as_deref().unwrap_or("-"),
                        "积分查询成功"
                    );
                    if let Some(sink) = &self.sink {
                        sink.submit(record).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(account = %self.credential.email, proxy = %proxy, "积分查询失败: {}", e);
                }
            }
        }
    }

    /// 可被关闭信号打断的休眠，被打断时返回 false
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
