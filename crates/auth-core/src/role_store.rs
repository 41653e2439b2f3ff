//! 角色存储契约

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::Identity;
use crate::principal::Role;

#[derive(Debug, Error)]
pub enum RoleStoreError {
    /// 身份没有对应记录, 上游按未认证处理, 不得回退到默认角色
    #[error("No role record for identity")]
    NotFound,

    #[error("Role store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed role record: {0}")]
    Malformed(String),
}

/// 身份 -> 当前角色
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_of(&self, identity: &Identity) -> Result<Role, RoleStoreError>;
}
