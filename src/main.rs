//! Dividend Tracker: binary entrypoint
//! Boots the Axum HTTP server with the company, autocomplete and dividend routes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines when `LOG_FORMAT=json`.
/// Filter comes from `RUST_LOG`, falling back to `dividend_tracker=info,warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dividend_tracker=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    // The runtime may already have installed a subscriber; keep theirs if so.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = dividend_tracker::app().await?;
    Ok(router.into())
}
