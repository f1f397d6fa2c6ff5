//! NeuroDrive - Main Entry Point
//!
//! Usage: `neurodrive [CONFIG_FILE]`. Every setting can also be overridden
//! from the environment, e.g. `NEURODRIVE__NETWORK__LISTEN_ADDR=0.0.0.0:5005`.

use anyhow::Context;
use gateway::{init_logging, install_exporter, Gateway, GatewayConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1);
    let config = GatewayConfig::load(path.as_deref()).context("loading configuration")?;

    init_logging(&config.logging)?;

    info!("=== NeuroDrive v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting self-healing telemetry gateway...");

    if let Some(addr) = config.metrics.listen_addr {
        install_exporter(addr)?;
    }

    let gateway = Gateway::bind(&config).await.context("binding sockets")?;
    let stats = gateway
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!(
        "Stopped after {} samples ({} rejected, {} commands)",
        stats.processed, stats.rejected, stats.commands
    );
    Ok(())
}
