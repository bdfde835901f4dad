use serde::Deserialize;

/// 登录响应体
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub data: LoginResponseData,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponseData {
    #[serde(default)]
    pub token: String,
}

/// 积分查询响应体
#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: PointsResponseData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsResponseData {
    pub reward_point: RewardPoint,
}

/// 服务端返回的积分信息
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardPoint {
    pub points: f64,
    /// 服务端可能返回 userId、email 或两者都有
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub last_keep_alive: Option<String>,
}

impl RewardPoint {
    /// 服务端标识的账号，优先 email
    pub fn owner(&self) -> Option<&str> {
        self.email.as_deref().or(self.user_id.as_deref())
    }
}

/// 单次积分查询的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PointsRecord {
    pub email: String,
    pub points: f64,
    pub last_keep_alive: Option<String>,
}

impl PointsRecord {
    /// 积分日志中的一行，末尾带换行
    pub fn to_log_line(&self) -> String {
        format!("{} - {:.2}\n", self.email, self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let resp: LoginResponse = serde_json::from_str(r#"{"data":{"token":"abc"}}"#).unwrap();
        assert_eq!(resp.data.token, "abc");
    }

    #[test]
    fn test_points_response_with_user_id() {
        let json = r#"{
            "status": 200,
            "message": "ok",
            "data": {"rewardPoint": {"points": 10, "userId": "u-1", "lastKeepAlive": "x"}}
        }"#;
        let resp: PointsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.reward_point.points, 10.0);
        assert_eq!(resp.data.reward_point.user_id.as_deref(), Some("u-1"));
        assert_eq!(resp.data.reward_point.owner(), Some("u-1"));
        assert_eq!(resp.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_points_response_with_user_id_and_email() {
        let json = r#"{"data":{"rewardPoint":{"points":42.5,"userId":"u-1","email":"a@example.com","lastKeepAlive":"x"}}}"#;
        let resp: PointsResponse = serde_json::from_str(json).unwrap();
        let reward = &resp.data.reward_point;
        assert_eq!(reward.points, 42.5);
        assert_eq!(reward.user_id.as_deref(), Some("u-1"));
        assert_eq!(reward.owner(), Some("a@example.com"));
    }

    #[test]
    fn test_log_line_format() {
        let record = PointsRecord {
            email: "a@example.com".to_string(),
            points: 42.5,
            last_keep_alive: None,
        };
        assert_eq!(record.to_log_line(), "a@example.com - 42.50\n");
    }
}
