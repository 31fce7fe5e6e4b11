//! HTTP surface
//!
//! Page sessions are held in memory, one mutex per page, and every route
//! returns the page view the theme renders. Sessions left idle expire.

pub mod checkout;
pub mod error;
pub mod products;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::pages::{CheckoutPage, ProductPage};
use crate::services::{EventPublisher, HttpStoreClient};

pub use error::ApiError;

/// In-memory page sessions keyed by a time-ordered id. Reads and writes
/// reset the idle timer; past `max_pages` the least used are evicted.
pub struct SessionStore<T> {
    sessions: Cache<Uuid, Arc<Mutex<T>>>,
}

impl<T: Send + 'static> SessionStore<T> {
    pub fn new(config: SessionConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_pages)
            .time_to_idle(config.idle_timeout())
            .build();
        Self { sessions }
    }

    pub async fn insert(&self, page: T) -> Uuid {
        let id = Uuid::now_v7();
        self.sessions.insert(id, Arc::new(Mutex::new(page))).await;
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<T>>> { self.sessions.get(&id).await }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<HttpStoreClient>,
    pub events: EventPublisher,
    pub checkouts: Arc<SessionStore<CheckoutPage>>,
    pub products: Arc<SessionStore<ProductPage>>,
}

impl AppState {
    pub fn new(store: HttpStoreClient, events: EventPublisher, sessions: SessionConfig) -> Self {
        Self {
            store: Arc::new(store),
            events,
            checkouts: Arc::new(SessionStore::new(sessions)),
            products: Arc::new(SessionStore::new(sessions)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-pages"})) }))
        .merge(checkout::routes())
        .merge(products::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
