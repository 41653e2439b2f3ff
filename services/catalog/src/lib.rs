//! Catalog Service - 图书目录服务
//!
//! 图书的增删改查, 每个操作先经访问守卫向外部决策点授权

pub mod api;
pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

use sqlx::migrate::Migrator;

/// 嵌入的数据库迁移
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
