//! `surface-worker` -- polls the assets root and processes queued jobs.
//!
//! # Environment variables
//!
//! | Variable                     | Default                    | Description                        |
//! |------------------------------|----------------------------|------------------------------------|
//! | `SURFACE_OUTPUT_DIR`         | `/data/hexforge3d/surface` | Job directory root                 |
//! | `SURFACE_PUBLIC_PREFIX`      | `/assets/surface`          | URL prefix for published artifacts |
//! | `HSE_WORKER_POLL_INTERVAL`   | `2`                        | Seconds to sleep after an idle pass |
//! | `HSE_WORKER_HEARTBEAT`       | `<root>/.worker_heartbeat` | Liveness file                      |
//! | `HSE_WORKER_SIMULATED_WORK`  | `2`                        | Placeholder generation delay       |
//!
//! Geometry gate thresholds are documented on
//! [`SurfaceConfig::from_env`](surface_core::config::SurfaceConfig::from_env).

use anyhow::Context;
use surface_core::config::SurfaceConfig;
use surface_pipeline::PlaceholderGenerator;
use surface_worker::{logging, Worker};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = SurfaceConfig::from_env();
    std::fs::create_dir_all(config.layout.root()).with_context(|| {
        format!(
            "failed to create assets root {}",
            config.layout.root().display()
        )
    })?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown requested; finishing current job");
        shutdown.cancel();
    });

    let generator = PlaceholderGenerator::new(config.simulated_work);
    Worker::new(config, generator).run(cancel).await;
    Ok(())
}
