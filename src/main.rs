mod admin;
mod api;
mod bid;
mod clock;
mod config;
mod db;
mod error;
mod events;
mod finalize;
mod ledger;
mod nominate;
mod quiet_hours;
mod sweeper;
#[cfg(test)]
mod testutil;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::quiet_hours::QuietHoursScheduler;
use crate::sweeper::AuctionSweeper;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    if cfg.admin_code.is_empty() {
        tracing::warn!(
            "ADMIN_CODE not set — nominate/finalize/settings/import endpoints will reject every request."
        );
    }

    // --- Shared observability state ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Spawn background tasks ---

    // Finalization sweep: deadlines are checked lazily, so this is the
    // trigger that closes expired auctions when no caller does.
    let sweeper = AuctionSweeper::new(pool.clone(), Arc::clone(&health));
    tokio::spawn(async move { sweeper.run().await });

    // Quiet-hours pause/resume across all drafts.
    let scheduler = QuietHoursScheduler::new(pool.clone(), Arc::clone(&health));
    tokio::spawn(async move { scheduler.run().await });

    // --- HTTP API server ---
    let api_state = ApiState {
        pool: pool.clone(),
        admin_code: cfg.admin_code.clone(),
        latency,
        health,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
