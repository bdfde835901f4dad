//! 奖励服务调用错误
//!
//! 登录失败统一归为 [`AuthError`]，心跳与积分查询失败归为 [`TransientError`]。
//! 变体仅用于日志区分，重试策略按类别处理。

use reqwest::StatusCode;
use thiserror::Error;

/// 登录失败
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("登录请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("登录被拒绝: {status} {body}")]
    Status { status: StatusCode, body: String },

    #[error("登录响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("登录响应缺少 token")]
    MissingToken,
}

/// 心跳或积分查询失败，等待下一轮即可
#[derive(Debug, Error)]
pub enum TransientError {
    #[error("请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("服务端返回错误状态: {status} {body}")]
    Status { status: StatusCode, body: String },

    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),
}
