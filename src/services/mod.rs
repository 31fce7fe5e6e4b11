//! External collaborators
//!
//! The pages never talk to the network directly. Each collaborator is a trait
//! so the page controllers can be driven by the HTTP client in production and
//! by in-memory fakes in tests.

pub mod events;
pub mod store_client;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

use crate::domain::aggregates::{GatewayKind, OrderPayload, Product, Review, StoreContext};

pub use events::EventPublisher;
pub use store_client::HttpStoreClient;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Text safe to show the shopper.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::Status { body, .. } if !body.is_empty() && body.len() <= 200 && !body.trim_start().starts_with('<') => body.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CouponRequest {
    pub store_id: u64,
    pub coupon_code: String,
    pub shipping_method_id: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CouponResponse {
    pub valid: bool,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    pub product_id: u64,
    pub rating: u8,
    pub title: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReviewResponse {
    pub success: bool,
    #[serde(default)]
    pub review: Option<Review>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_number: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Store backend endpoints used while rendering and submitting pages.
pub trait StoreApi: Send + Sync {
    fn validate_coupon(&self, request: &CouponRequest) -> impl Future<Output = Result<CouponResponse, ServiceError>> + Send;
    fn states(&self, country_id: u64) -> impl Future<Output = Result<Vec<Location>, ServiceError>> + Send;
    fn cities(&self, state_id: u64) -> impl Future<Output = Result<Vec<Location>, ServiceError>> + Send;
    fn submit_review(&self, request: &ReviewRequest) -> impl Future<Output = Result<ReviewResponse, ServiceError>> + Send;
}

/// Client-side checkout flow of one payment provider.
pub trait PaymentGateway: Send + Sync {
    fn handle_order_placement(
        &self,
        gateway: GatewayKind,
        payload: &OrderPayload,
        store: &StoreContext,
    ) -> impl Future<Output = Result<OrderConfirmation, ServiceError>> + Send;
}

pub trait CartContext: Send + Sync {
    fn add_to_cart(
        &self,
        product: &Product,
        variants: &BTreeMap<String, String>,
        quantity: u32,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

pub trait WishlistContext: Send + Sync {
    /// Flips membership and returns the new state.
    fn toggle_wishlist(&self, product_id: u64) -> impl Future<Output = Result<bool, ServiceError>> + Send;
    fn is_in_wishlist(&self, product_id: u64) -> impl Future<Output = Result<bool, ServiceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        assert_eq!(ServiceError::Rejected("Coupon expired".into()).user_message(), "Coupon expired");
        let html = ServiceError::Status { status: 500, body: "<html>oops</html>".into() };
        assert_eq!(html.user_message(), GENERIC_FAILURE);
        let plain = ServiceError::Status { status: 422, body: "Minimum order not met".into() };
        assert_eq!(plain.user_message(), "Minimum order not met");
        assert_eq!(ServiceError::Decode("eof".into()).user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_coupon_response_defaults() {
        let response: CouponResponse = serde_json::from_str(r#"{"valid": false, "message": "Expired"}"#).unwrap();
        assert!(!response.valid);
        assert_eq!(response.discount, Decimal::ZERO);
    }
}
