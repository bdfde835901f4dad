//! 代理分配策略

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 分配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentPolicy {
    /// 每个账号 × 每个代理各起一个 worker
    PerProxy,
    /// 代理按序轮流分给各账号
    #[default]
    RoundRobin,
    /// 代理按连续区间平均分给各账号，余数给靠前的账号
    EvenSplit,
}

impl AssignmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerProxy => "per-proxy",
            Self::RoundRobin => "round-robin",
            Self::EvenSplit => "even-split",
        }
    }
}

impl fmt::Display for AssignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-proxy" => Ok(Self::PerProxy),
            "round-robin" => Ok(Self::RoundRobin),
            "even-split" => Ok(Self::EvenSplit),
            other => anyhow::bail!(
                "未知的分配策略: {} (可选 per-proxy / round-robin / even-split)",
                other
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_as_str() {
        for policy in [
            AssignmentPolicy::PerProxy,
            AssignmentPolicy::RoundRobin,
            AssignmentPolicy::EvenSplit,
        ] {
            assert_eq!(policy.as_str().parse::<AssignmentPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_from_str_unknown() {
        assert!("random".parse::<AssignmentPolicy>().is_err());
    }

    #[test]
    fn test_serde_kebab_case() {
        let policy: AssignmentPolicy = serde_json::from_str("\"even-split\"").unwrap();
        assert_eq!(policy, AssignmentPolicy::EvenSplit);
    }
}
