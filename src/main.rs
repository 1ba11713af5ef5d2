//! civichub - civic data hub.
//!
//! Resolves street addresses to legislative districts and the officials who
//! represent them, syncing districts and officials from upstream sources.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if civichub::cli::is_verbose() {
        "civichub=info"
    } else {
        "civichub=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    civichub::cli::run().await
}
