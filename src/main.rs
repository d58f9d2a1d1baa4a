use anyhow::Context;
use api_rest::{router, AppState};
use lawmark_core::{store, CoreConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Lawmark application
///
/// Serves the REST API with Swagger UI, on port 3000 by default.
///
/// Every request except `/health` must carry the gateway's `x-api-key` when `API_KEY` is set.
/// The gateway forwards the authenticated user in `x-username` and their capabilities in
/// `x-capabilities`.
///
/// # Environment Variables
/// - `LAWMARK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `LAWMARK_DATABASE`: SQLite database file (default: "lawmark.db")
/// - `LAWMARK_NPA_FILE`: YAML NPA catalogue (default: built-in catalogue)
/// - `LAWMARK_PAGE_SIZE`, `LAWMARK_MAX_PAGE_SIZE`, `LAWMARK_PAGINATE`: search pagination
/// - `LAWMARK_BUSY_TIMEOUT_MS`: how long writers wait on a locked database
/// - `API_KEY`: gateway API key
///
/// # Returns
/// * `Ok(())` - If the server starts, runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lawmark=info".parse()?)
                .add_directive("lawmark_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("LAWMARK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_env().context("invalid Lawmark configuration")?;
    store::initialise(&cfg).with_context(|| {
        format!(
            "failed to initialise database at {}",
            cfg.database_path().display()
        )
    })?;
    tracing::info!(
        database = %cfg.database_path().display(),
        npa_codes = cfg.npa_catalogue().entries().len(),
        "++ Database ready"
    );

    let api_key = std::env::var("API_KEY").ok();
    if api_key.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("API_KEY is not set; requests are accepted without a gateway key");
    }

    let app = router(AppState::new(Arc::new(cfg), api_key));

    tracing::info!("++ Starting Lawmark REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr)
        .await
        .with_context(|| format!("failed to bind {rest_addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Lawmark REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
