//! Storefront Pages Engine
//!
//! Checkout and product-detail behavior shared by every storefront theme.
//! Themes only supply presentation parameters; the wizard, validation, order
//! summary, payment dispatch, variant picker and review flow live here once.
//!
//! ## Layers
//! - `domain`: themes, value objects, page aggregates and domain events
//! - `pages`: per-visitor page controllers driving the collaborators
//! - `services`: store backend client, payment gateways and event publishing
//! - `api`: axum routes exposing page sessions as JSON

pub mod api;
pub mod config;
pub mod domain;
pub mod pages;
pub mod services;

use thiserror::Error;

pub use config::{ConfigError, SessionConfig, StorefrontConfig};

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store backend error: {0}")]
    Service(#[from] services::ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Builds shared state from configuration: the store client and, when
/// configured, the NATS event publisher.
pub async fn build_state(config: &StorefrontConfig) -> Result<api::AppState> {
    let store = services::HttpStoreClient::new(
        &config.store_api.base_url,
        config.store_api.timeout_secs,
        config.store_api.user_agent.as_deref(),
    )?;
    let events = services::EventPublisher::connect(config.nats_url.as_deref()).await;
    Ok(api::AppState::new(store, events, config.sessions))
}
