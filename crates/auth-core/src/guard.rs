//! 访问守卫
//!
//! 组合身份解析、角色存储和决策点, 在任何领域操作之前给出唯一的授权结论。
//!
//! 单个请求的状态机:
//! `Start -> Identified -> PrincipalBuilt -> Authorized`,
//! 任一步失败直接进入 `Denied`, 请求内不重试。

use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_more::Display;
use http::HeaderMap;
use shelf_errors::AppError;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::identity::{Identity, IdentityResolver};
use crate::metrics;
use crate::policy::PolicyClient;
use crate::principal::{Action, Decision, Principal, Resource};
use crate::role_store::{RoleStore, RoleStoreError};

/// 授权生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzStage {
    Start,
    Identified,
    PrincipalBuilt,
    Authorized,
    Denied,
}

impl AuthzStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthzStage::Start => "start",
            AuthzStage::Identified => "identified",
            AuthzStage::PrincipalBuilt => "principal_built",
            AuthzStage::Authorized => "authorized",
            AuthzStage::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DenyReason {
    #[display("policy denied")]
    PolicyDenied,
    #[display("decision unavailable")]
    DecisionUnavailable,
    #[display("grant issued for another action")]
    GrantMismatch,
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not permitted to {action}: {reason}")]
    Forbidden { action: Action, reason: DenyReason },

    #[error("Authorization failed: {0}")]
    Internal(String),
}

impl AuthzError {
    /// 请求在哪个阶段被拒绝
    pub fn stage(&self) -> AuthzStage {
        match self {
            AuthzError::Unauthenticated => AuthzStage::Start,
            AuthzError::Internal(_) => AuthzStage::Identified,
            AuthzError::Forbidden { .. } => AuthzStage::PrincipalBuilt,
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => AppError::unauthenticated("Please log in to continue"),
            // 不区分策略拒绝和决策点不可用
            AuthzError::Forbidden { action, .. } => {
                AppError::forbidden(format!("Not permitted to {} this resource", action))
            }
            AuthzError::Internal(msg) => AppError::internal(msg),
        }
    }
}

/// 授权凭据
///
/// 只能由 [`AccessGuard`] 产生, 且绑定到一个操作
#[derive(Debug, Clone)]
pub struct Grant {
    principal: Principal,
    action: Action,
}

impl Grant {
    pub(crate) fn new(principal: Principal, action: Action) -> Self {
        Self { principal, action }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// 确认凭据对应指定操作
    pub fn require(&self, action: Action) -> Result<&Principal, AuthzError> {
        if self.action == action {
            Ok(&self.principal)
        } else {
            Err(AuthzError::Forbidden {
                action,
                reason: DenyReason::GrantMismatch,
            })
        }
    }
}

/// 守卫超时配置
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub role_lookup_timeout: Duration,
    pub decision_timeout: Duration,
    pub sync_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            role_lookup_timeout: Duration::from_secs(5),
            decision_timeout: Duration::from_secs(10),
            sync_timeout: Duration::from_secs(15),
        }
    }
}

/// 访问守卫
///
/// 无请求间可变状态, 以 `Arc` 共享给所有处理器
#[derive(Clone)]
pub struct AccessGuard {
    resolver: IdentityResolver,
    roles: Arc<dyn RoleStore>,
    policy: Arc<dyn PolicyClient>,
    resource: Resource,
    config: GuardConfig,
}

impl AccessGuard {
    pub fn new(
        resolver: IdentityResolver,
        roles: Arc<dyn RoleStore>,
        policy: Arc<dyn PolicyClient>,
        resource: Resource,
        config: GuardConfig,
    ) -> Self {
        Self {
            resolver,
            roles,
            policy,
            resource,
            config,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// 授权一次请求
    ///
    /// 每次调用恰好询问决策点一次 (身份和角色都解析成功时)。
    /// 不修改任何领域状态, 也不触发 sync。
    pub async fn authorize(&self, headers: &HeaderMap, action: Action) -> Result<Grant, AuthzError> {
        let identity = match self.resolver.resolve(headers) {
            Ok(identity) => identity,
            Err(e) => {
                debug!(action = %action, reason = %e, "No identity on request");
                return Err(self.deny(action, AuthzError::Unauthenticated));
            }
        };

        self.authorize_identity(identity, action).await
    }

    /// 对已解析的身份授权
    pub async fn authorize_identity(
        &self,
        identity: Identity,
        action: Action,
    ) -> Result<Grant, AuthzError> {
        let role = match tokio::time::timeout(
            self.config.role_lookup_timeout,
            self.roles.role_of(&identity),
        )
        .await
        {
            Ok(Ok(role)) => role,
            Ok(Err(RoleStoreError::NotFound)) => {
                debug!(identity = %identity, action = %action, "Identity has no role record");
                return Err(self.deny(action, AuthzError::Unauthenticated));
            }
            Ok(Err(e)) => {
                error!(identity = %identity, action = %action, error = %e, "Role lookup failed");
                return Err(self.deny(action, AuthzError::Internal(e.to_string())));
            }
            Err(_) => {
                error!(
                    identity = %identity,
                    action = %action,
                    timeout_ms = self.config.role_lookup_timeout.as_millis() as u64,
                    "Role lookup timed out"
                );
                return Err(self.deny(
                    action,
                    AuthzError::Internal("role lookup timed out".to_string()),
                ));
            }
        };

        let principal = Principal::new(identity, role);
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.config.decision_timeout,
            self.policy.check(&principal, action, &self.resource),
        )
        .await;
        metrics::record_check_duration(action, started.elapsed());

        match outcome {
            Ok(Ok(Decision::Allow)) => {
                debug!(
                    identity = %principal.identity(),
                    role = %principal.role(),
                    action = %action,
                    "Request authorized"
                );
                metrics::record_decision(action, AuthzStage::Authorized, true);
                Ok(Grant::new(principal, action))
            }
            Ok(Ok(Decision::Deny)) => {
                debug!(
                    identity = %principal.identity(),
                    role = %principal.role(),
                    action = %action,
                    "Policy denied request"
                );
                Err(self.deny(
                    action,
                    AuthzError::Forbidden {
                        action,
                        reason: DenyReason::PolicyDenied,
                    },
                ))
            }
            Ok(Err(e)) => {
                warn!(
                    identity = %principal.identity(),
                    action = %action,
                    error = %e,
                    "Decision point unavailable, denying"
                );
                Err(self.deny(
                    action,
                    AuthzError::Forbidden {
                        action,
                        reason: DenyReason::DecisionUnavailable,
                    },
                ))
            }
            Err(_) => {
                warn!(
                    identity = %principal.identity(),
                    action = %action,
                    timeout_ms = self.config.decision_timeout.as_millis() as u64,
                    "Decision point timed out, denying"
                );
                Err(self.deny(
                    action,
                    AuthzError::Forbidden {
                        action,
                        reason: DenyReason::DecisionUnavailable,
                    },
                ))
            }
        }
    }

    /// 尽力把主体同步到决策点
    ///
    /// 失败只记录日志和指标, 下次登录时会重新同步
    pub async fn sync_principal(&self, principal: &Principal) {
        match tokio::time::timeout(self.config.sync_timeout, self.policy.sync(principal)).await {
            Ok(Ok(())) => {
                debug!(identity = %principal.identity(), role = %principal.role(), "Principal synced");
            }
            Ok(Err(e)) => {
                warn!(identity = %principal.identity(), error = %e, "Principal sync failed");
                metrics::record_sync_failure();
            }
            Err(_) => {
                warn!(
                    identity = %principal.identity(),
                    timeout_ms = self.config.sync_timeout.as_millis() as u64,
                    "Principal sync timed out"
                );
                metrics::record_sync_failure();
            }
        }
    }

    fn deny(&self, action: Action, err: AuthzError) -> AuthzError {
        metrics::record_decision(action, err.stage(), false);
        err
    }
}
