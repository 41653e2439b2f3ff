//! PostgreSQL 用户凭据仓储实现

use async_trait::async_trait;
use shelf_errors::AppResult;
use sqlx::PgPool;

use super::map_sqlx_error;
use crate::domain::user::{HashedPassword, UserCredentials, UserRepository};

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    username: String,
    password_hash: String,
    role: String,
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| UserCredentials {
            username: r.username,
            password_hash: HashedPassword::from_hash(r.password_hash),
            role: r.role,
        }))
    }
}
