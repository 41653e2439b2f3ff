//! 健康检查模块
//!
//! 提供 /health、/ready 和 /metrics 端点

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use shelf_adapter_postgres::check_connection;
use shelf_auth_core::PolicyClient;
use sqlx::PgPool;
use tracing::warn;

use crate::metrics::MetricsRecorder;

/// 健康检查状态
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub checks: Vec<ComponentHealth>,
}

/// 组件健康状态
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            checks: vec![],
        }
    }

    pub fn add_check(&mut self, check: ComponentHealth) {
        if check.status != "healthy" {
            self.status = "unhealthy".to_string();
        }
        self.checks.push(check);
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "healthy".to_string(),
            message: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "unhealthy".to_string(),
            message: Some(message.into()),
        }
    }
}

const UNREACHABLE: &str = "unreachable";

/// 健康检查器
pub struct HealthChecker {
    pool: PgPool,
    policy: Arc<dyn PolicyClient>,
}

impl HealthChecker {
    pub fn new(pool: PgPool, policy: Arc<dyn PolicyClient>) -> Self {
        Self { pool, policy }
    }

    /// 存活检查, 不检查依赖
    pub async fn liveness(&self) -> HealthStatus {
        HealthStatus::healthy()
    }

    /// 就绪检查: PostgreSQL 和决策点都可达
    pub async fn readiness(&self) -> HealthStatus {
        let mut status = HealthStatus::healthy();
        status.add_check(self.check_postgres().await);
        status.add_check(self.check_policy().await);
        status
    }

    // 错误详情只写日志, 响应体里不出现主机和端口
    async fn check_postgres(&self) -> ComponentHealth {
        match check_connection(&self.pool).await {
            Ok(()) => ComponentHealth::healthy("postgres"),
            Err(e) => {
                warn!(component = "postgres", error = %e, "Readiness check failed");
                ComponentHealth::unhealthy("postgres", UNREACHABLE)
            }
        }
    }

    async fn check_policy(&self) -> ComponentHealth {
        match self.policy.health_check().await {
            Ok(()) => ComponentHealth::healthy("pdp"),
            Err(e) => {
                warn!(component = "pdp", error = %e, "Readiness check failed");
                ComponentHealth::unhealthy("pdp", UNREACHABLE)
            }
        }
    }
}

#[derive(Clone)]
struct OpsState {
    checker: Arc<HealthChecker>,
    metrics: Arc<MetricsRecorder>,
}

/// 运维端点路由, 合并进业务 Router
pub fn ops_routes(checker: Arc<HealthChecker>, metrics: Arc<MetricsRecorder>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(OpsState { checker, metrics })
}

async fn health_handler(State(state): State<OpsState>) -> impl IntoResponse {
    let status = state.checker.liveness().await;
    (StatusCode::OK, Json(status))
}

async fn ready_handler(State(state): State<OpsState>) -> impl IntoResponse {
    let status = state.checker.readiness().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn metrics_handler(State(state): State<OpsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}
