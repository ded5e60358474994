//! News feed relay: binary entrypoint.
//! Loads config, prunes the link ledger, then runs the pipeline now and on a
//! fixed interval until the process is stopped.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_feed_relay::bootstrap::build_scheduler;
use news_feed_relay::config::RelayConfig;
use news_feed_relay::telemetry;

/// Compact logs by default; `LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_feed_relay=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr: SocketAddr = addr.parse().context("METRICS_ADDR must be host:port")?;
        telemetry::install_prometheus(addr)?;
        tracing::info!(%addr, "prometheus listener up");
    } else {
        telemetry::ensure_metrics_described();
    }

    let token = std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN missing")?;
    let cfg = RelayConfig::load_default().context("loading relay config")?;
    let scheduler = build_scheduler(cfg, token)?;

    let ticker = scheduler.start().await;

    tokio::select! {
        res = ticker => {
            // The ticker loop never returns on its own; reaching this means it panicked.
            res.context("scheduler loop stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }
    Ok(())
}
