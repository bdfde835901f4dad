use clap::Parser;

use crate::points_log::DEFAULT_POINTS_LOG;
use crate::pool::AssignmentPolicy;

/// 多账号奖励服务保活客户端
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// 配置文件路径（.toml 或 .json）
    #[arg(short, long)]
    pub config: Option<String>,

    /// 代理分配策略，覆盖配置文件: per-proxy / round-robin / even-split
    #[arg(long)]
    pub policy: Option<AssignmentPolicy>,

    /// 写入积分日志，可指定文件路径，覆盖配置文件
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_POINTS_LOG)]
    pub points_log: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_flag() {
        let args = Args::parse_from(["blockmesh-rs", "--policy", "per-proxy", "-c", "my.toml"]);
        assert_eq!(args.policy, Some(AssignmentPolicy::PerProxy));
        assert_eq!(args.config.as_deref(), Some("my.toml"));
        assert!(args.points_log.is_none());
    }

    #[test]
    fn test_points_log_flag_without_value() {
        let args = Args::parse_from(["blockmesh-rs", "--points-log"]);
        assert_eq!(args.points_log.as_deref(), Some("account_points.txt"));

        let args = Args::parse_from(["blockmesh-rs", "--points-log", "out.txt"]);
        assert_eq!(args.points_log.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Args::try_parse_from(["blockmesh-rs", "--policy", "random"]).is_err());
    }
}
