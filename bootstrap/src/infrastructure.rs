//! 基础设施资源管理
//!
//! 统一创建服务共享的连接池和决策点客户端

use std::sync::Arc;

use secrecy::ExposeSecret;
use shelf_adapter_pdp::{HttpPolicyClient, PdpConfigBuilder};
use shelf_adapter_postgres::{PostgresConfig, apply_migrations, create_pool, is_transient};
use shelf_auth_core::PolicyClient;
use shelf_common::{RetryConfig, with_retry_if};
use shelf_config::AppConfig;
use shelf_errors::{AppError, AppResult};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

/// 基础设施资源容器
///
/// 连接池和 HTTP 客户端内部都可并发共享
#[derive(Clone)]
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: PgPool,
    policy_client: Arc<dyn PolicyClient>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源 (数据库连接带重试)
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let retry_config = RetryConfig::default();

        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections);
        let postgres_pool = with_retry_if(
            &retry_config,
            "PostgreSQL connection",
            || {
                let cfg = pg_config.clone();
                async move { create_pool(&cfg).await }
            },
            is_transient,
        )
        .await
        .map_err(|e| AppError::database(format!("Failed to create pool: {}", e)))?;
        info!(
            max_connections = config.database.max_connections,
            "PostgreSQL connection pool created"
        );

        let policy_client = Self::build_policy_client(&config)?;

        Ok(Self::from_parts(config, postgres_pool, policy_client))
    }

    /// 用已有资源组装, 测试中注入替身
    pub fn from_parts(
        config: AppConfig,
        postgres_pool: PgPool,
        policy_client: Arc<dyn PolicyClient>,
    ) -> Self {
        Self {
            config,
            postgres_pool,
            policy_client,
        }
    }

    fn build_policy_client(config: &AppConfig) -> AppResult<Arc<dyn PolicyClient>> {
        let policy = &config.policy;
        let pdp_config = PdpConfigBuilder::new(&policy.pdp_url)
            .with_api_url(&policy.api_url)
            .with_api_key(policy.api_key.clone())
            .with_scope(&policy.project, &policy.environment)
            .with_check_timeout(policy.check_timeout())
            .with_sync_timeout(policy.sync_timeout())
            .with_connect_timeout(policy.connect_timeout())
            .build();

        let client = HttpPolicyClient::new(pdp_config)
            .map_err(|e| AppError::internal(format!("Invalid policy client config: {}", e)))?;
        Ok(Arc::new(client))
    }

    /// 按配置执行迁移
    pub async fn run_migrations(&self, migrator: &Migrator) -> AppResult<()> {
        if !self.config.database.run_migrations {
            info!("Migrations disabled, skipping");
            return Ok(());
        }
        apply_migrations(&self.postgres_pool, migrator).await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }

    pub fn policy_client(&self) -> Arc<dyn PolicyClient> {
        self.policy_client.clone()
    }
}
