//! PostgreSQL 角色存储

use async_trait::async_trait;
use shelf_auth_core::{Identity, Role, RoleStore, RoleStoreError};
use sqlx::PgPool;

/// 按用户名查询当前角色, 每次都读库
pub struct PostgresRoleStore {
    pool: PgPool,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_role_error(e: sqlx::Error) -> RoleStoreError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            RoleStoreError::Malformed(e.to_string())
        }
        other => RoleStoreError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl RoleStore for PostgresRoleStore {
    async fn role_of(&self, identity: &Identity) -> Result<Role, RoleStoreError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE username = $1")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_role_error)?;

        match role {
            None => Err(RoleStoreError::NotFound),
            Some(role) if role.trim().is_empty() => {
                Err(RoleStoreError::Malformed("empty role".to_string()))
            }
            Some(role) => Ok(Role::new(role)),
        }
    }
}
