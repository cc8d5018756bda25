use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use urbanstay::config::AppConfig;
use urbanstay::db::Store;
use urbanstay::handlers;
use urbanstay::services::payments::cashfree::CashfreeProvider;
use urbanstay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    let store = Store::open(&config.database_url)?;
    tracing::info!(database = %config.database_url, "database ready");

    if config.cashfree_app_id.is_empty() || config.cashfree_secret_key.is_empty() {
        tracing::warn!("CASHFREE_APP_ID / CASHFREE_SECRET_KEY not set, payment calls will fail");
    }
    tracing::info!(
        env = ?config.cashfree_env,
        "using Cashfree payment provider ({})",
        config.cashfree_env.base_url()
    );
    let payments = CashfreeProvider::from_config(&config);

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        payments: Box::new(payments),
    });

    let app = handlers::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
