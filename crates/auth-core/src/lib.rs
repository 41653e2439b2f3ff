//! shelf-auth-core - 授权核心库
//!
//! 请求授权链路: Cookie -> 身份 -> 角色 -> 外部决策点 -> 放行/拒绝

pub mod guard;
pub mod identity;
pub mod metrics;
pub mod policy;
pub mod principal;
pub mod role_store;

pub use guard::{AccessGuard, AuthzError, AuthzStage, DenyReason, Grant, GuardConfig};
pub use identity::{Identity, IdentityError, IdentityResolver};
pub use policy::{PolicyClient, PolicyError};
pub use principal::{Action, Decision, Principal, Resource, Role};
pub use role_store::{RoleStore, RoleStoreError};
