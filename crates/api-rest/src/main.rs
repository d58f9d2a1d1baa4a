//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `lawmark-run` binary serves the
//! same router and is what deployments run.

use anyhow::Context;
use api_rest::{router, AppState};
use lawmark_core::{store, CoreConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Lawmark REST API server
///
/// # Environment Variables
/// - `LAWMARK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `API_KEY`: gateway key required in `x-api-key` (unset disables the check)
/// - `LAWMARK_*`: core configuration, see `CoreConfig::from_env`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the core configuration is invalid or the database cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("lawmark_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("LAWMARK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_env().context("invalid Lawmark configuration")?;
    store::initialise(&cfg).with_context(|| {
        format!(
            "failed to initialise database at {}",
            cfg.database_path().display()
        )
    })?;

    let api_key = std::env::var("API_KEY").ok();
    if api_key.as_deref().map_or(true, str::is_empty) {
        tracing::warn!("API_KEY is not set; requests are accepted without a gateway key");
    }

    let app = router(AppState::new(Arc::new(cfg), api_key));

    tracing::info!("-- Starting Lawmark REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
