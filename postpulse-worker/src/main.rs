//! # PostPulse Worker
//!
//! Publishes scheduled posts whose `scheduled_at` has passed. Runs as its own
//! process next to the API server, with its own connection pool.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p postpulse-worker
//! ```

use postpulse_shared::{
    db::pool::{close_pool, create_pool, DatabaseConfig},
    telemetry::init_tracing,
};
use postpulse_worker::{config::WorkerConfig, sweep::ScheduledPublisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("postpulse_worker=debug,postpulse_shared=info");

    tracing::info!("PostPulse Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone()).with_max_connections(config.max_connections),
    )
    .await?;

    let publisher = ScheduledPublisher::new(pool.clone(), config.sweep_interval);
    let shutdown = publisher.shutdown_token();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
        }
        shutdown.cancel();
    });

    publisher.run().await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}
