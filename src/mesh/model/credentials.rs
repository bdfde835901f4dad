//! 账号凭证数据模型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 账号凭证（对应配置中 `data.auth` 的一项）
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// 登录邮箱
    pub email: String,
    /// 登录密码
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// 密码不进日志
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_entry() {
        let creds: Credential =
            toml::from_str("email = \"a@example.com\"\npassword = \"pw\"").unwrap();
        assert_eq!(creds, Credential::new("a@example.com", "pw"));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credential::new("a@example.com", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("a@example.com"));
        assert!(!shown.contains("hunter2"));
    }
}
