//! Portfolio feeds service: binary entrypoint.
//! Boots the Axum HTTP server, wiring feed controllers, contact mail, and metrics.

use std::sync::Arc;

use portfolio_feeds::feeds::config::FeedsConfig;
use portfolio_feeds::feeds::transport::HttpTransport;
use portfolio_feeds::metrics::Metrics;
use portfolio_feeds::{router, AppState};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEEDS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEEDS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("portfolio_feeds=info,retry=warn,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = FeedsConfig::load_default()?;
    let transport = HttpTransport::new(&cfg.user_agent, cfg.timeout())?;

    let state = AppState::from_config(&cfg, Arc::new(transport));
    state.spawn_initial_loads();

    let metrics = Metrics::init()?;
    let app = router(state).merge(metrics.router());

    Ok(app.into())
}
