//! 外部决策点契约

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::principal::{Action, Decision, Principal, Resource};

/// 决策点不可用
///
/// 任何变体对 `check` 而言都等同于拒绝
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Decision point transport error: {0}")]
    Transport(String),

    #[error("Decision point did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Decision point returned status {0}")]
    Status(u16),

    #[error("Unexpected decision point response: {0}")]
    Protocol(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// 把 (身份, 角色) 推送给决策点
    async fn sync(&self, principal: &Principal) -> Result<(), PolicyError>;

    /// 询问 (主体, 操作, 资源) 是否放行
    async fn check(
        &self,
        principal: &Principal,
        action: Action,
        resource: &Resource,
    ) -> Result<Decision, PolicyError>;

    /// 决策点是否可达, 用于 readiness
    async fn health_check(&self) -> Result<(), PolicyError> {
        Ok(())
    }
}
