//! Metrics 模块
//!
//! Prometheus 导出和 HTTP 请求指标

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusHandle};

/// Metrics 记录器
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    /// 安装全局 Prometheus 记录器, 进程内只能调用一次
    pub fn install() -> Result<Self, BuildError> {
        Ok(Self {
            handle: shelf_telemetry::init_metrics()?,
        })
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// 获取 Prometheus 格式的 metrics
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// 记录 HTTP 请求
pub fn record_http_request(method: &str, route: &str, status: u16, duration_ms: f64) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_ms", &labels).record(duration_ms);
}

/// 请求指标中间件
///
/// 以路由模板作为标签, 避免路径参数导致标签爆炸
pub async fn track_http(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    record_http_request(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64() * 1000.0,
    );
    response
}
