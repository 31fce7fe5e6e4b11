//! HTTP client for the store backend
//!
//! One client covers every collaborator the pages need: coupon validation,
//! location lookups, review submission, gateway order creation and the
//! cart/wishlist endpoints.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    CartContext, CouponRequest, CouponResponse, Location, OrderConfirmation, PaymentGateway, ReviewRequest,
    ReviewResponse, ServiceError, StoreApi, WishlistContext,
};
use crate::domain::aggregates::{GatewayKind, OrderPayload, Product, StoreContext};

const DEFAULT_USER_AGENT: &str = concat!("storefront-pages/", env!("CARGO_PKG_VERSION"));

pub struct HttpStoreClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct StatesResponse {
    #[serde(default)]
    states: Vec<Location>,
}

#[derive(Deserialize)]
struct CitiesResponse {
    #[serde(default)]
    cities: Vec<Location>,
}

#[derive(Deserialize)]
struct GatewayResponse {
    success: bool,
    #[serde(default)]
    order_number: Option<String>,
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct WishlistResponse {
    in_wishlist: bool,
}

#[derive(Deserialize)]
struct Acknowledgement {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

fn default_true() -> bool { true }

#[derive(Serialize)]
struct GatewayRequest<'a> {
    store: &'a StoreContext,
    order: &'a OrderPayload,
}

impl HttpStoreClient {
    /// Builds a client rooted at the store backend's base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, user_agent: Option<&str>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let response = self.client.get(self.url(path)).header("Accept", "application/json").send().await?;
        Self::decode(path, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).header("Accept", "application/json").json(body).send().await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "Store backend returned an error status");
            return Err(ServiceError::Status { status: status.as_u16(), body: error_message(&body) });
        }
        serde_json::from_str(&body).map_err(|e| ServiceError::Decode(format!("{path}: {e}")))
    }
}

/// Prefers the backend's `message` field over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

impl StoreApi for HttpStoreClient {
    async fn validate_coupon(&self, request: &CouponRequest) -> Result<CouponResponse, ServiceError> {
        match self.post_json::<_, CouponResponse>("/api/coupon/validate", request).await {
            // Invalid coupons are commonly answered with a 4xx and a message.
            Err(ServiceError::Status { status, body }) if (400..500).contains(&status) => {
                Ok(CouponResponse { valid: false, discount: Default::default(), message: Some(body) })
            }
            other => other,
        }
    }

    async fn states(&self, country_id: u64) -> Result<Vec<Location>, ServiceError> {
        let response: StatesResponse = self.get_json(&format!("/api/locations/states/{country_id}")).await?;
        Ok(response.states)
    }

    async fn cities(&self, state_id: u64) -> Result<Vec<Location>, ServiceError> {
        let response: CitiesResponse = self.get_json(&format!("/api/locations/cities/{state_id}")).await?;
        Ok(response.cities)
    }

    async fn submit_review(&self, request: &ReviewRequest) -> Result<ReviewResponse, ServiceError> {
        self.post_json("/api/reviews", request).await
    }
}

impl PaymentGateway for HttpStoreClient {
    async fn handle_order_placement(
        &self,
        gateway: GatewayKind,
        payload: &OrderPayload,
        store: &StoreContext,
    ) -> Result<OrderConfirmation, ServiceError> {
        let path = format!("/store/{}/payments/{}/create-order", store.slug, gateway.as_str());
        let response: GatewayResponse = self.post_json(&path, &GatewayRequest { store, order: payload }).await?;
        if !response.success {
            return Err(ServiceError::Rejected(response.message.unwrap_or_else(|| "Payment failed".to_string())));
        }
        let order_number = response
            .order_number
            .ok_or_else(|| ServiceError::Decode(format!("{path}: missing order_number")))?;
        Ok(OrderConfirmation { order_number, redirect_url: response.redirect_url })
    }
}

impl CartContext for HttpStoreClient {
    async fn add_to_cart(&self, product: &Product, variants: &BTreeMap<String, String>, quantity: u32) -> Result<(), ServiceError> {
        let body = json!({ "product_id": product.id, "quantity": quantity, "variants": variants });
        let ack: Acknowledgement = self.post_json("/api/cart/add", &body).await?;
        if !ack.success {
            return Err(ServiceError::Rejected(ack.message.unwrap_or_else(|| "Could not add to cart".to_string())));
        }
        Ok(())
    }
}

impl WishlistContext for HttpStoreClient {
    async fn toggle_wishlist(&self, product_id: u64) -> Result<bool, ServiceError> {
        let response: WishlistResponse = self.post_json("/api/wishlist/toggle", &json!({ "product_id": product_id })).await?;
        Ok(response.in_wishlist)
    }

    async fn is_in_wishlist(&self, product_id: u64) -> Result<bool, ServiceError> {
        let response: WishlistResponse = self.get_json(&format!("/api/wishlist/check/{product_id}")).await?;
        Ok(response.in_wishlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message":"Coupon expired"}"#), "Coupon expired");
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpStoreClient::new("https://shop.test/", 5, None).unwrap();
        assert_eq!(client.url("/api/reviews"), "https://shop.test/api/reviews");
    }
}
