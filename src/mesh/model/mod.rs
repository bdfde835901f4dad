//! 奖励服务数据模型
//!
//! - `credentials`: 账号凭证
//! - `requests`: 请求体
//! - `responses`: 响应体与积分记录

pub mod credentials;
pub mod requests;
pub mod responses;
