//! `genfeed-watch` -- follow a generation server's job feed.
//!
//! Keeps a reconnecting WebSocket connection to the server, logs status
//! changes, and prints every ready model as a JSON line on stdout.
//!
//! # Environment variables
//!
//! | Variable                     | Required | Default | Description                              |
//! |------------------------------|----------|---------|------------------------------------------|
//! | `GENFEED_SERVER_URL`         | yes      | --      | Server origin, e.g. `https://host:8000`  |
//! | `GENFEED_RECONNECT_DELAY_MS` | no       | `3000`  | Fixed delay before reconnecting          |
//! | `GENFEED_LOG_JSON`           | no       | --      | `1` for JSON log lines                   |
//! | `RUST_LOG`                   | no       | `genfeed_watch=info,genfeed_client=info` | Log filter |

use anyhow::Context;
use genfeed_client::FeedClient;
use genfeed_core::FeedConfig;
use genfeed_watch::report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = FeedConfig::from_env().context("Invalid feed configuration")?;
    tracing::info!(
        server_url = %config.server_url(),
        endpoint = %config.endpoint(),
        reconnect_delay_ms = config.reconnect_delay().as_millis() as u64,
        "Starting genfeed-watch",
    );

    let client = FeedClient::new(config);
    report::run(&client, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "genfeed_watch=info,genfeed_client=info".into());
    let json = std::env::var("GENFEED_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
