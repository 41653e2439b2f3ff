//! 迁移执行

use shelf_errors::{AppError, AppResult};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

/// 执行嵌入的迁移
pub async fn apply_migrations(pool: &PgPool, migrator: &Migrator) -> AppResult<()> {
    let total = migrator.iter().count();
    info!(migrations = total, "Applying database migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Migration failed: {}", e)))?;

    info!("Database migrations applied");
    Ok(())
}
