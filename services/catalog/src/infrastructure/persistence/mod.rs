//! PostgreSQL 仓储实现

mod book_repository;
mod user_repository;
mod user_role_repository;

pub use book_repository::PostgresBookRepository;
pub use user_repository::PostgresUserRepository;
pub use user_role_repository::PostgresRoleStore;

use shelf_errors::AppError;

/// 将 sqlx 错误转换为 AppError
fn map_sqlx_error(e: sqlx::Error) -> AppError {
    AppError::database(e.to_string())
}
