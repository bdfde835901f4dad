use serde::Serialize;

/// 登录时间戳格式（本地时间）
pub const LOGIN_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 登录请求体
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub logindata: LoginData<'a>,
}

/// 登录附带的客户端信息
#[derive(Debug, Serialize)]
pub struct LoginData<'a> {
    #[serde(rename = "_v")]
    pub version: &'a str,
    pub datetime: String,
}

/// 心跳请求体
#[derive(Debug, Serialize)]
pub struct KeepAliveRequest<'a> {
    pub username: &'a str,
    pub extensionid: &'a str,
    pub numberoftabs: u32,
    #[serde(rename = "_v")]
    pub version: &'a str,
}
