//! 代理分配模块
//!
//! 按分配策略把代理池分给各账号，每个分配结果对应一个 worker

pub mod assignment;
pub mod strategy;

pub use assignment::assign;
pub use strategy::AssignmentPolicy;
