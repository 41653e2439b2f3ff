//! shelf-bootstrap - 统一服务启动骨架
//!
//! 配置加载、日志、基础设施、运维端点和 HTTP 服务生命周期

mod health;
mod infrastructure;
mod metrics;
mod runtime;
mod starter;

pub use health::*;
pub use infrastructure::*;
pub use metrics::*;
pub use runtime::*;
pub use starter::*;
