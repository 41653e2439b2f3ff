//! 单元测试共用的替身

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use shelf_auth_core::{
    AccessGuard, Action, Decision, Grant, GuardConfig, Identity, IdentityResolver, PolicyClient,
    PolicyError, Principal, Resource, Role, RoleStore, RoleStoreError,
};

pub struct FixedRoles(pub HashMap<String, String>);

impl FixedRoles {
    pub fn of(entries: &[(&str, &str)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[async_trait]
impl RoleStore for FixedRoles {
    async fn role_of(&self, identity: &Identity) -> Result<Role, RoleStoreError> {
        self.0
            .get(identity.as_str())
            .map(Role::new)
            .ok_or(RoleStoreError::NotFound)
    }
}

/// admin 全部放行, 其他角色只能 view
#[derive(Default)]
pub struct AdminPolicy {
    pub fail_sync: bool,
    pub syncs: AtomicUsize,
}

#[async_trait]
impl PolicyClient for AdminPolicy {
    async fn sync(&self, _principal: &Principal) -> Result<(), PolicyError> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync {
            Err(PolicyError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }

    async fn check(
        &self,
        principal: &Principal,
        action: Action,
        _resource: &Resource,
    ) -> Result<Decision, PolicyError> {
        Ok(Decision::from_allowed(
            principal.role().as_str() == "admin" || action == Action::View,
        ))
    }
}

pub fn guard_with(roles: Arc<dyn RoleStore>, policy: Arc<dyn PolicyClient>) -> Arc<AccessGuard> {
    Arc::new(AccessGuard::new(
        IdentityResolver::new("username"),
        roles,
        policy,
        Resource::new("books", "default"),
        GuardConfig::default(),
    ))
}

pub fn session_cookie(identity: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("username={}", identity)) {
        headers.insert(header::COOKIE, value);
    }
    headers
}

/// 通过守卫签发一个 admin 凭据
pub async fn admin_grant(action: Action) -> Grant {
    let guard = guard_with(
        Arc::new(FixedRoles::of(&[("alice", "admin")])),
        Arc::new(AdminPolicy::default()),
    );
    match guard.authorize(&session_cookie("alice"), action).await {
        Ok(grant) => grant,
        Err(e) => panic!("admin should be allowed to {}: {}", action, e),
    }
}
