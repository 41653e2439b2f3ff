//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use shelf_config::AppConfig;
use shelf_errors::AppResult;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::health::{HealthChecker, ops_routes};
use crate::infrastructure::Infrastructure;
use crate::metrics::{MetricsRecorder, track_http};
use crate::runtime::{init_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 1. 加载配置
/// 2. 初始化日志和 Prometheus 记录器
/// 3. 创建基础设施 (数据库连接带重试)
/// 4. 调用闭包构建业务路由
/// 5. 合并 /health、/ready、/metrics
/// 6. 启动服务器, 收到信号后等待在途请求完成
///
/// # 示例
///
/// ```ignore
/// use shelf_bootstrap::run_http;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_http("config", |infra| async move {
///         Ok(my_routes(infra))
///     }).await
/// }
/// ```
pub async fn run_http<F, Fut>(config_dir: &str, router_builder: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Infrastructure) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)?;

    init_runtime(&config);

    info!("Starting {} service", config.app_name);

    let metrics = Arc::new(MetricsRecorder::install()?);

    let infra = Infrastructure::from_config(config.clone()).await?;

    let health_checker = Arc::new(HealthChecker::new(
        infra.postgres_pool(),
        infra.policy_client(),
    ));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let app = router_builder(infra)
        .await?
        .merge(ops_routes(health_checker, metrics))
        .route_layer(middleware::from_fn(track_http))
        .layer(TraceLayer::new_for_http());

    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service stopped");

    Ok(())
}
