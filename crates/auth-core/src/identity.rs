//! 身份解析
//!
//! 会话 Cookie 的值就是调用方身份。真实性只在登录时校验一次,
//! 之后的请求仅检查 Cookie 是否存在。
//!
//! 身份可以是任意非空字符串, 写入 Cookie 时做百分号编码, 读取时解码。

use std::time::Duration;

use derive_more::Display;
use http::{HeaderMap, HeaderValue, header};
use thiserror::Error;

/// 调用方身份 (会话级不透明字符串)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct Identity(String);

impl Identity {
    /// 只拒绝空值
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdentityError::Missing);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Session cookie not present")]
    Missing,

    #[error("Session cookie value is not a valid identity")]
    InvalidValue,
}

/// 从请求头中解析身份, 并负责签发/清除会话 Cookie
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    cookie_name: String,
    max_age: Duration,
    secure: bool,
}

impl IdentityResolver {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            max_age: Duration::from_secs(24 * 60 * 60),
            secure: false,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// 解析身份
    ///
    /// 多个 Cookie 头或同名 Cookie 时, 跳过空值和无法解码的值, 取第一个有效值。
    /// 没有有效值时: 出现过无法解码的值返回 `InvalidValue`, 否则返回 `Missing`。
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Identity, IdentityError> {
        let mut invalid = false;

        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                invalid = true;
                continue;
            };

            for pair in raw.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                if name.trim() != self.cookie_name {
                    continue;
                }

                let value = value.trim().trim_matches('"');
                if value.is_empty() {
                    continue;
                }
                match urlencoding::decode(value) {
                    Ok(decoded) if !decoded.is_empty() => {
                        return Ok(Identity(decoded.into_owned()));
                    }
                    _ => invalid = true,
                }
            }
        }

        if invalid {
            Err(IdentityError::InvalidValue)
        } else {
            Err(IdentityError::Missing)
        }
    }

    /// 登录成功后下发的 Set-Cookie
    pub fn issue_cookie(&self, identity: &Identity) -> Result<HeaderValue, IdentityError> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.cookie_name,
            urlencoding::encode(identity.as_str()),
            self.max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|_| IdentityError::InvalidValue)
    }

    /// 登出时下发的 Set-Cookie
    pub fn clear_cookie(&self) -> Result<HeaderValue, IdentityError> {
        let mut cookie = format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            self.cookie_name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|_| IdentityError::InvalidValue)
    }
}
