//! Storefront Pages Engine - themed checkout and product pages over HTTP

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_pages::{api, build_state, StorefrontConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StorefrontConfig::from_env()?;
    let state = build_state(&config).await?;
    let app = api::router(state);

    let addr = config.socket_addr();
    tracing::info!(%addr, store_api = %config.store_api.base_url, "Storefront pages listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
