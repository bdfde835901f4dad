//! 账号与代理的分配

use crate::http_client::ProxyConfig;
use crate::mesh::model::credentials::Credential;

use super::strategy::AssignmentPolicy;

/// 一个 worker 的分配结果：一个账号和它使用的代理列表
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyAssignment {
    pub credential: Credential,
    /// 为空表示直连
    pub proxies: Vec<ProxyConfig>,
}

impl ProxyAssignment {
    /// worker 实际使用的线路，空代理列表对应一条直连线路
    pub fn routes(&self) -> Vec<Option<ProxyConfig>> {
        if self.proxies.is_empty() {
            vec![None]
        } else {
            self.proxies.iter().cloned().map(Some).collect()
        }
    }
}

/// 按策略把代理分配给账号
///
/// - 不会遗漏任何代理
/// - `round-robin` / `even-split` 下同一代理不会分给多个账号
/// - 没分到代理的账号走直连
pub fn assign(
    accounts: &[Credential],
    proxies: &[ProxyConfig],
    policy: AssignmentPolicy,
) -> Vec<ProxyAssignment> {
    if accounts.is_empty() {
        return Vec::new();
    }

    let buckets: Vec<Vec<ProxyConfig>> = match policy {
        AssignmentPolicy::PerProxy => {
            return accounts
                .iter()
                .flat_map(|credential| {
                    let singles: Vec<Vec<ProxyConfig>> = if proxies.is_empty() {
                        vec![Vec::new()]
                    } else {
                        proxies.iter().map(|p| vec![p.clone()]).collect()
                    };
                    singles.into_iter().map(move |proxies| ProxyAssignment {
                        credential: credential.clone(),
                        proxies,
                    })
                })
                .collect();
        }
        AssignmentPolicy::RoundRobin => {
            let mut buckets = vec![Vec::new(); accounts.len()];
            for (i, proxy) in proxies.iter().enumerate() {
                buckets[i % accounts.len()].push(proxy.clone());
            }
            buckets
        }
        AssignmentPolicy::EvenSplit => {
            let per_account = proxies.len() / accounts.len();
            let extra = proxies.len() % accounts.len();

            let mut buckets = Vec::with_capacity(accounts.len());
            let mut start = 0;
            for i in 0..accounts.len() {
                let take = per_account + usize::from(i < extra);
                buckets.push(proxies[start..start + take].to_vec());
                start += take;
            }
            buckets
        }
    };

    if !proxies.is_empty() && proxies.len() < accounts.len() {
        tracing::warn!(
            "代理数量 ({}) 少于账号数量 ({})，部分账号将直连",
            proxies.len(),
            accounts.len()
        );
    }

    accounts
        .iter()
        .cloned()
        .zip(buckets)
        .map(|(credential, proxies)| ProxyAssignment {
            credential,
            proxies,
        })
        .collect()
}
