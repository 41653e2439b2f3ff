//! 授权查询中的值对象

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// 角色标签, 例如 "user"、"admin"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 绑定了角色的身份, 作为授权查询的主体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    identity: Identity,
    role: Role,
}

impl Principal {
    pub fn new(identity: Identity, role: Role) -> Self {
        Self { identity, role }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

/// 受保护的资源类别及其租户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    kind: String,
    tenant: String,
}

impl Resource {
    pub fn new(kind: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            tenant: tenant.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}

/// 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[display("view")]
    View,
    #[display("create")]
    Create,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// 单次请求的授权结论, 不跨请求复用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}
