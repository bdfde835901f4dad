//! 奖励服务 API Provider
//!
//! 负责与奖励服务通信：登录、心跳、积分查询。
//! 每个 Provider 对应一条线路（一个代理或直连）。

use async_trait::async_trait;
use chrono::Local;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, USER_AGENT,
};
use reqwest::Client;
use std::sync::Arc;

use crate::http_client::{build_client, ClientOptions, ProxyConfig};
use crate::mesh::error::{AuthError, TransientError};
use crate::mesh::model::credentials::Credential;
use crate::mesh::model::requests::{KeepAliveRequest, LoginData, LoginRequest, LOGIN_DATETIME_FORMAT};
use crate::mesh::model::responses::{LoginResponse, PointsRecord, PointsResponse};
use crate::mesh::session::Session;

/// 奖励服务的调用接口
///
/// worker 只依赖这个 trait，测试中可以替换为内存实现
#[async_trait]
pub trait RewardsApi: Send + Sync {
    /// 线路描述（代理地址或 direct），仅用于日志
    fn route(&self) -> String;

    async fn login(&self, credential: &Credential) -> Result<Session, AuthError>;

    async fn keep_alive(&self, session: &Session, credential: &Credential)
        -> Result<(), TransientError>;

    async fn fetch_points(
        &self,
        session: &Session,
        credential: &Credential,
    ) -> Result<PointsRecord, TransientError>;
}

/// 奖励服务接口参数
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub login_path: String,
    pub keepalive_path: String,
    pub points_path: String,
    /// 客户端版本号（请求体中的 `_v`）
    pub client_version: String,
    /// 浏览器扩展 ID
    pub extension_id: String,
    pub user_agent: String,
}

impl ApiSettings {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// 单条线路上的 API Provider
pub struct MeshProvider {
    settings: Arc<ApiSettings>,
    proxy: Option<ProxyConfig>,
    headers: HeaderMap,
    client: Client,
}

impl MeshProvider {
    /// 创建 Provider，`proxy` 为 None 时直连
    pub fn new(
        settings: Arc<ApiSettings>,
        proxy: Option<ProxyConfig>,
        options: &ClientOptions,
    ) -> anyhow::Result<Self> {
        let client = build_client(proxy.as_ref(), options)?;
        let headers = Self::build_headers(&settings)?;
        Ok(Self {
            settings,
            proxy,
            headers,
            client,
        })
    }

    /// 构建模拟浏览器扩展的固定请求头
    fn build_headers(settings: &ApiSettings) -> anyhow::Result<HeaderMap> {
        let origin = format!("chrome-extension://{}", settings.extension_id);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_str(&origin)?);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            HeaderName::from_static("priority"),
            HeaderValue::from_static("u=1, i"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("empty"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("cors"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("cross-site"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_str(&settings.user_agent)?);

        Ok(headers)
    }
}

#[async_trait]
impl RewardsApi for MeshProvider {
    fn route(&self) -> String {
        self.proxy
            .as_ref()
            .map(|p| p.redacted())
            .unwrap_or_else(|| "direct".to_string())
    }

    async fn login(&self, credential: &Credential) -> Result<Session, AuthError> {
        let body = LoginRequest {
            username: &credential.email,
            password: &credential.password,
            logindata: LoginData {
                version: &self.settings.client_version,
                datetime: Local::now().format(LOGIN_DATETIME_FORMAT).to_string(),
            },
        };

        let response = self
            .client
            .post(self.settings.url(&self.settings.login_path))
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Status { status, body: text });
        }

        let parsed: LoginResponse = serde_json::from_str(&text)?;
        if parsed.data.token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        Ok(Session::new(parsed.data.token))
    }

    async fn keep_alive(
        &self,
        session: &Session,
        credential: &Credential,
    ) -> Result<(), TransientError> {
        let body = KeepAliveRequest {
            username: &credential.email,
            extensionid: &self.settings.extension_id,
            numberoftabs: 0,
            version: &self.settings.client_version,
        };

        let response = self
            .client
            .post(self.settings.url(&self.settings.keepalive_path))
            .headers(self.headers.clone())
            .header(reqwest::header::AUTHORIZATION, session.bearer())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransientError::Status { status, body });
        }

        Ok(())
    }

    async fn fetch_points(
        &self,
        session: &Session,
        credential: &Credential,
    ) -> Result<PointsRecord, TransientError> {
        let response = self
            .client
            .get(self.settings.url(&self.settings.points_path))
            .headers(self.headers.clone())
            .header(reqwest::header::AUTHORIZATION, session.bearer())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(TransientError::Status { status, body: text });
        }

        parse_points(&credential.email, &text)
    }
}

/// 解析积分查询响应
///
/// 记录中的 email 始终使用本地账号，服务端返回的 userId/email 只用于日志
pub fn parse_points(email: &str, body: &str) -> Result<PointsRecord, TransientError> {
    let parsed: PointsResponse = serde_json::from_str(body)?;
    tracing::trace!(
        account = %email,
        status = ?parsed.status,
        message = parsed.message.as_deref().unwrap_or(""),
        remote = parsed.data.reward_point.owner().unwrap_or("-"),
        "积分响应"
    );

    let reward = parsed.data.reward_point;

    Ok(PointsRecord {
        email: email.to_string(),
        points: reward.points,
        last_keep_alive: reward.last_keep_alive,
    })
}
