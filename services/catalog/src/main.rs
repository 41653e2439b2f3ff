//! Catalog Service 入口

use catalog::{MIGRATOR, api::http::router, app::assemble};
use shelf_bootstrap::{Infrastructure, run_http};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_http("config", |infra: Infrastructure| async move {
        infra.run_migrations(&MIGRATOR).await?;

        let assembly = assemble(&infra);
        if let Some(listener) = assembly.listener {
            tokio::spawn(listener.start());
        }

        info!("Catalog routes ready");
        Ok(router(assembly.state))
    })
    .await
}
