//! Checkout page routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, Result};
use super::AppState;
use crate::domain::aggregates::{AddressPatch, CartItem, Checkout, PaymentMethod, PlacementOutcome, ShippingMethod, StoreContext};
use crate::domain::theme::Theme;
use crate::pages::{CheckoutPage, CheckoutView, Placement};
use crate::services::{Location, PaymentGateway, StoreApi};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/checkout", post(create))
        .route("/api/v1/checkout/:id", get(show))
        .route("/api/v1/checkout/:id/shipping", put(update_shipping))
        .route("/api/v1/checkout/:id/billing", put(update_billing))
        .route("/api/v1/checkout/:id/shipping-method", put(select_shipping_method))
        .route("/api/v1/checkout/:id/country", put(select_country))
        .route("/api/v1/checkout/:id/state", put(select_state))
        .route("/api/v1/checkout/:id/city", put(select_city))
        .route("/api/v1/checkout/:id/advance", post(advance))
        .route("/api/v1/checkout/:id/back", post(back))
        .route("/api/v1/checkout/:id/coupon", post(apply_coupon).delete(remove_coupon))
        .route("/api/v1/checkout/:id/payment", put(select_payment))
        .route("/api/v1/checkout/:id/place", post(place_order))
}

#[derive(Debug, Deserialize)]
pub struct StoreRef { pub id: u64, pub slug: String, #[serde(default)] pub name: Option<String> }

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub theme: Theme,
    pub store: StoreRef,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub countries: Vec<Location>,
}

#[derive(Debug, Serialize)]
pub struct CreatedCheckout { pub id: Uuid, pub view: CheckoutView }

#[derive(Debug, Deserialize)]
pub struct BillingRequest {
    #[serde(default)]
    pub same_as_shipping: Option<bool>,
    #[serde(flatten)]
    pub patch: AddressPatch,
}

#[derive(Debug, Deserialize)]
pub struct IdRequest { pub id: u64 }

#[derive(Debug, Deserialize)]
pub struct CouponBody { pub code: String }

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse { pub outcome: PlacementOutcome, pub view: CheckoutView }

/// Drains the page's notices and events into a response.
async fn respond(state: &AppState, page: &mut CheckoutPage) -> Json<CheckoutView> {
    let view = page.view();
    page.take_notices();
    state.events.publish_all(page.take_events()).await;
    Json(view)
}

async fn create(State(s): State<AppState>, Json(r): Json<CreateCheckoutRequest>) -> Result<(StatusCode, Json<CreatedCheckout>)> {
    let mut store = StoreContext::new(r.store.id, r.store.slug, s.store.base_url());
    store.name = r.store.name;
    let checkout = Checkout::new(store, r.items, r.shipping_methods, r.payment_methods, r.tax)?;
    let mut page = CheckoutPage::new(r.theme, checkout, r.countries, Uuid::new_v4().to_string());
    let view = page.view();
    page.take_notices();
    let id = s.checkouts.insert(page).await;
    tracing::info!(session = %id, theme = %r.theme, "Checkout session created");
    Ok((StatusCode::CREATED, Json(CreatedCheckout { id, view })))
}

async fn show(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    Ok(respond(&s, &mut page).await)
}

async fn update_shipping(State(s): State<AppState>, Path(id): Path<Uuid>, Json(patch): Json<AddressPatch>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.checkout_mut().update_shipping(patch)?;
    Ok(respond(&s, &mut page).await)
}

async fn update_billing(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<BillingRequest>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    if let Some(same) = r.same_as_shipping {
        page.checkout_mut().set_billing_same_as_shipping(same)?;
    }
    page.checkout_mut().update_billing(r.patch)?;
    Ok(respond(&s, &mut page).await)
}

async fn select_shipping_method(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<IdRequest>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.checkout_mut().select_shipping_method(r.id)?;
    Ok(respond(&s, &mut page).await)
}

/// The session lock is released while the lookup runs; a newer selection
/// made meanwhile invalidates this response.
async fn select_country(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<IdRequest>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let ticket = session.lock().await.begin_country(r.id)?;
    let states = s.store.states(r.id).await;
    let mut page = session.lock().await;
    page.finish_states(ticket, states);
    Ok(respond(&s, &mut page).await)
}

async fn select_state(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<IdRequest>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let ticket = session.lock().await.begin_state(r.id)?;
    let cities = s.store.cities(r.id).await;
    let mut page = session.lock().await;
    page.finish_cities(ticket, cities);
    Ok(respond(&s, &mut page).await)
}

async fn select_city(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<IdRequest>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.select_city(r.id)?;
    Ok(respond(&s, &mut page).await)
}

async fn advance(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.checkout_mut().advance()?;
    Ok(respond(&s, &mut page).await)
}

async fn back(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.checkout_mut().back()?;
    Ok(respond(&s, &mut page).await)
}

/// Like the location lookups, the store call runs without the session lock.
async fn apply_coupon(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<CouponBody>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let check = session.lock().await.begin_coupon(&r.code)?;
    if let Some(check) = check {
        let result = s.store.validate_coupon(&check.request).await;
        session.lock().await.finish_coupon(check, result)?;
    }
    let mut page = session.lock().await;
    Ok(respond(&s, &mut page).await)
}

async fn remove_coupon(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.remove_coupon()?;
    Ok(respond(&s, &mut page).await)
}

async fn select_payment(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<PaymentRequest>) -> Result<Json<CheckoutView>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    let checkout = page.checkout_mut();
    checkout.select_payment_method(r.method)?;
    if let Some(number) = r.whatsapp_number {
        checkout.set_whatsapp_number(number)?;
    }
    if let Some(notes) = r.notes {
        checkout.set_notes(notes)?;
    }
    Ok(respond(&s, &mut page).await)
}

/// Gateway calls run without the session lock; the checkout stays in
/// `processing` meanwhile so a second submit is refused.
async fn place_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PlaceOrderResponse>> {
    let session = s.checkouts.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let placement = session.lock().await.begin_placement();
    let outcome = match placement {
        Ok(Placement::Ready(outcome)) => Ok(outcome),
        Ok(Placement::AwaitGateway { gateway, payload }) => {
            let store = session.lock().await.checkout().store().clone();
            let result = s.store.handle_order_placement(gateway, &payload, &store).await;
            session.lock().await.finish_gateway(result)
        }
        Err(e) => Err(e),
    };
    let mut page = session.lock().await;
    let Json(view) = respond(&s, &mut page).await;
    Ok(Json(PlaceOrderResponse { outcome: outcome?, view }))
}
