use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::http_client::{ClientOptions, ProxyConfig};
use crate::mesh::model::credentials::Credential;
use crate::mesh::provider::ApiSettings;
use crate::pool::AssignmentPolicy;
use crate::worker::{RetryPolicy, WorkerSettings};

/// 应用配置
///
/// 沿用原有 `conf.toml` 的布局：`proxies.data` 为代理列表，`data.auth` 为账号列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 代理分配策略
    #[serde(default)]
    pub policy: AssignmentPolicy,

    /// 积分日志文件（可选，不配置则不写）
    #[serde(default)]
    pub points_log: Option<String>,

    /// 运行日志目录
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub proxies: ProxiesConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// 奖励服务接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 服务地址（必填）
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_keepalive_path")]
    pub keepalive_path: String,

    #[serde(default = "default_points_path")]
    pub points_path: String,

    /// 客户端版本号
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// 浏览器扩展 ID
    #[serde(default = "default_extension_id")]
    pub extension_id: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 是否跳过 TLS 证书校验
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

/// 调度配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 心跳间隔（秒）
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,

    /// token 可信时长（秒）
    #[serde(default = "default_relogin_after_secs")]
    pub relogin_after_secs: u64,

    /// 登录失败后首次重试等待（秒）
    #[serde(default = "default_login_retry_base_secs")]
    pub login_retry_base_secs: u64,

    /// 登录重试等待上限（秒）
    #[serde(default = "default_login_retry_max_secs")]
    pub login_retry_max_secs: u64,

    /// 连续登录失败多少次后放弃（可选，不配置则无限重试）
    #[serde(default)]
    pub login_max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxiesConfig {
    #[serde(default)]
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub auth: Vec<Credential>,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_keepalive_path() -> String {
    "/keepalive".to_string()
}

fn default_points_path() -> String {
    "/points".to_string()
}

fn default_client_version() -> String {
    "1.0.6".to_string()
}

fn default_extension_id() -> String {
    "fpdkjdnhkakefebpekbdhillbhonfjjp".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_keepalive_interval_secs() -> u64 {
    3 * 60
}

fn default_relogin_after_secs() -> u64 {
    2 * 60 * 60
}

fn default_login_retry_base_secs() -> u64 {
    60
}

fn default_login_retry_max_secs() -> u64 {
    15 * 60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            login_path: default_login_path(),
            keepalive_path: default_keepalive_path(),
            points_path: default_points_path(),
            client_version: default_client_version(),
            extension_id: default_extension_id(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: default_keepalive_interval_secs(),
            relogin_after_secs: default_relogin_after_secs(),
            login_retry_base_secs: default_login_retry_base_secs(),
            login_retry_max_secs: default_login_retry_max_secs(),
            login_max_attempts: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: AssignmentPolicy::default(),
            points_log: None,
            log_dir: default_log_dir(),
            api: ApiConfig::default(),
            schedule: ScheduleConfig::default(),
            proxies: ProxiesConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "conf.toml"
    }

    /// 从文件加载配置，按扩展名区分 JSON 与 TOML
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置，由 validate 报告缺失项
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config)
    }

    /// 从环境变量覆盖配置
    ///
    /// 返回被忽略的环境变量说明，日志初始化后再输出
    pub fn override_from_env(&mut self) -> Vec<String> {
        self.override_with(|key| env::var(key).ok())
    }

    fn override_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut ignored = Vec::new();

        if let Some(url) = lookup("API_BASE_URL") {
            self.api.base_url = Some(url);
        }
        if let Some(policy) = lookup("POLICY") {
            match policy.parse::<AssignmentPolicy>() {
                Ok(p) => self.policy = p,
                Err(e) => ignored.push(format!("忽略环境变量 POLICY: {}", e)),
            }
        }
        if let Some(path) = lookup("POINTS_LOG") {
            self.points_log = Some(path);
        }
        if let Some(secs) = lookup("KEEPALIVE_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.schedule.keepalive_interval_secs = s,
                Err(e) => ignored.push(format!("忽略环境变量 KEEPALIVE_INTERVAL_SECS={}: {}", secs, e)),
            }
        }
        if let Some(secs) = lookup("RELOGIN_AFTER_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.schedule.relogin_after_secs = s,
                Err(e) => ignored.push(format!("忽略环境变量 RELOGIN_AFTER_SECS={}: {}", secs, e)),
            }
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.log_dir = dir;
        }

        ignored
    }

    /// 校验必填项
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.api.base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                url::Url::parse(url).map_err(|e| anyhow::anyhow!("api.base_url 无效 {}: {}", url, e))?;
            }
            _ => anyhow::bail!("缺少 api.base_url"),
        }
        if self.data.auth.is_empty() {
            anyhow::bail!("data.auth 中没有账号");
        }
        if let Some(c) = self.data.auth.iter().find(|c| c.email.is_empty()) {
            anyhow::bail!("存在 email 为空的账号: {:?}", c);
        }
        if self.schedule.keepalive_interval_secs == 0 {
            anyhow::bail!("schedule.keepalive_interval_secs 不能为 0");
        }
        if self.schedule.relogin_after_secs == 0 {
            anyhow::bail!("schedule.relogin_after_secs 不能为 0");
        }
        if self.schedule.login_retry_base_secs == 0 {
            anyhow::bail!("schedule.login_retry_base_secs 不能为 0");
        }
        if self.schedule.login_max_attempts == Some(0) {
            anyhow::bail!("schedule.login_max_attempts 不能为 0");
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api.base_url.clone().unwrap_or_default(),
            login_path: self.api.login_path.clone(),
            keepalive_path: self.api.keepalive_path.clone(),
            points_path: self.api.points_path.clone(),
            client_version: self.api.client_version.clone(),
            extension_id: self.api.extension_id.clone(),
            user_agent: self.api.user_agent.clone(),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout_secs: self.api.timeout_secs,
            accept_invalid_certs: self.api.accept_invalid_certs,
        }
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        let schedule = &self.schedule;
        WorkerSettings {
            keepalive_interval: Duration::from_secs(schedule.keepalive_interval_secs),
            relogin_after: Duration::from_secs(schedule.relogin_after_secs),
            login_retry: RetryPolicy {
                base: Duration::from_secs(schedule.login_retry_base_secs),
                max: Duration::from_secs(
                    schedule.login_retry_max_secs.max(schedule.login_retry_base_secs),
                ),
                max_attempts: schedule.login_max_attempts,
            },
        }
    }

    /// 代理列表，去掉空行与首尾空白
    pub fn proxy_configs(&self) -> Vec<ProxyConfig> {
        self.proxies
            .data
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(ProxyConfig::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_TOML: &str = r#"
policy = "even-split"

[api]
base_url = "https://api.example.com"

[schedule]
login_max_attempts = 5

[proxies]
data = ["http://10.0.0.1:8080", "  ", "socks5://10.0.0.2:1080"]

[data]
auth = [
    { email = "a@example.com", password = "pw-a" },
    { email = "b@example.com", password = "pw-b" },
]
"#;

    #[test]
    fn test_parse_toml_layout() {
        let config: Config = toml::from_str(SAMPLE_TOML).unwrap();
        assert_eq!(config.policy, AssignmentPolicy::EvenSplit);
        assert_eq!(config.data.auth.len(), 2);
        assert_eq!(config.data.auth[1].password, "pw-b");
        assert_eq!(config.proxy_configs().len(), 2);
        assert_eq!(config.schedule.keepalive_interval_secs, 180);
        assert_eq!(config.schedule.login_max_attempts, Some(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"api":{{"base_url":"https://api.example.com"}},"data":{{"auth":[{{"email":"a@example.com","password":"pw"}}]}}}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.policy, AssignmentPolicy::RoundRobin);
        assert!(config.proxy_configs().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let config = Config::load("definitely-missing-conf.toml").unwrap();
        assert!(config.data.auth.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_base_url() {
        let mut config: Config = toml::from_str(SAMPLE_TOML).unwrap();
        config.api.base_url = None;
        assert!(config.validate().is_err());

        config.api.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config: Config = toml::from_str(SAMPLE_TOML).unwrap();
        config.schedule.keepalive_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    fn env_of<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = Config::default();
        let ignored = config.override_with(env_of(&[
            ("API_BASE_URL", "https://env.example.com"),
            ("POLICY", "per-proxy"),
            ("KEEPALIVE_INTERVAL_SECS", "60"),
            ("LOG_DIR", "/tmp/logs"),
        ]));

        assert!(ignored.is_empty());
        assert_eq!(config.api.base_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.policy, AssignmentPolicy::PerProxy);
        assert_eq!(config.schedule.keepalive_interval_secs, 60);
        assert_eq!(config.log_dir, "/tmp/logs");
    }

    #[test]
    fn test_env_invalid_policy_is_reported() {
        let mut config = Config::default();
        let ignored = config.override_with(env_of(&[("POLICY", "evensplit")]));

        assert_eq!(config.policy, AssignmentPolicy::RoundRobin);
        assert_eq!(ignored.len(), 1);
        assert!(ignored[0].contains("POLICY"));
    }

    #[test]
    fn test_env_invalid_intervals_are_reported() {
        let mut config = Config::default();
        let ignored = config.override_with(env_of(&[
            ("KEEPALIVE_INTERVAL_SECS", "3m"),
            ("RELOGIN_AFTER_SECS", "-1"),
        ]));

        assert_eq!(config.schedule.keepalive_interval_secs, 180);
        assert_eq!(config.schedule.relogin_after_secs, 7200);
        assert_eq!(ignored.len(), 2);
        assert!(ignored[0].contains("KEEPALIVE_INTERVAL_SECS=3m"));
        assert!(ignored[1].contains("RELOGIN_AFTER_SECS=-1"));
    }

    #[test]
    fn test_worker_settings_defaults() {
        let settings = Config::default().worker_settings();
        assert_eq!(settings.keepalive_interval, Duration::from_secs(180));
        assert_eq!(settings.relogin_after, Duration::from_secs(7200));
        assert_eq!(settings.login_retry.base, Duration::from_secs(60));
        assert_eq!(settings.login_retry.max, Duration::from_secs(900));
        assert_eq!(settings.login_retry.max_attempts, None);
    }

    #[test]
    fn test_api_settings_defaults() {
        let settings = Config::default().api_settings();
        assert_eq!(settings.login_path, "/login");
        assert_eq!(settings.keepalive_path, "/keepalive");
        assert_eq!(settings.points_path, "/points");
        assert_eq!(settings.client_version, "1.0.6");
    }
}
