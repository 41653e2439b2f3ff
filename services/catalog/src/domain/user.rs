//! 用户凭据

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use shelf_errors::{AppError, AppResult};
use std::fmt;

/// Argon2 PHC 格式的密码哈希
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// 哈希明文密码
    pub fn hash(plain_password: &str) -> AppResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?
            .to_string();
        Ok(Self(hash))
    }

    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    /// 验证明文密码; 存储的哈希无法解析时返回错误
    pub fn verify(&self, plain_password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&self.0)
            .map_err(|e| AppError::internal(format!("Stored password hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedPassword([REDACTED])")
    }
}

/// 登录所需的用户记录
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password_hash: HashedPassword,
    pub role: String,
}

/// 用户凭据仓储
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;
}
