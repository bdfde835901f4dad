//! 奖励服务客户端
//!
//! 登录、心跳与积分查询，以及对应的数据模型和错误类型

pub mod error;
pub mod model;
pub mod provider;
pub mod session;
