//! Product page routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, Result};
use super::AppState;
use crate::domain::aggregates::{Product, ProductTab, ReviewForm};
use crate::domain::theme::Theme;
use crate::pages::{ProductPage, ProductView};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", post(create))
        .route("/api/v1/products/:id", get(show))
        .route("/api/v1/products/:id/variant", put(select_variant))
        .route("/api/v1/products/:id/quantity", put(change_quantity))
        .route("/api/v1/products/:id/tab", put(select_tab))
        .route("/api/v1/products/:id/image", put(change_image))
        .route("/api/v1/products/:id/cart", post(add_to_cart))
        .route("/api/v1/products/:id/wishlist", post(toggle_wishlist))
        .route("/api/v1/products/:id/review-modal", post(review_modal))
        .route("/api/v1/products/:id/reviews", post(submit_review))
}

#[derive(Debug, Deserialize)]
pub struct CreateProductPageRequest {
    #[serde(default)]
    pub theme: Theme,
    pub product: Product,
    #[serde(default)]
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedProductPage { pub id: Uuid, pub view: ProductView }

#[derive(Debug, Deserialize)]
pub struct VariantRequest { pub name: String, pub value: String }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityChange { Set(u32), Increment, Decrement }

#[derive(Debug, Deserialize)]
pub struct TabRequest { pub tab: ProductTab }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageChange { Select(usize), Next, Previous }

#[derive(Debug, Deserialize)]
pub struct ReviewModalRequest { pub open: bool }

async fn respond(state: &AppState, page: &mut ProductPage) -> Json<ProductView> {
    let view = page.view();
    page.take_notices();
    state.events.publish_all(page.take_events()).await;
    Json(view)
}

async fn create(State(s): State<AppState>, Json(r): Json<CreateProductPageRequest>) -> Result<(StatusCode, Json<CreatedProductPage>)> {
    let customer = r.customer_name.unwrap_or_else(|| "Guest".to_string());
    let mut page = ProductPage::new(r.theme, r.product, customer);
    page.sync_wishlist(&*s.store).await;
    let view = page.view();
    let product_id = view.id;
    let id = s.products.insert(page).await;
    tracing::info!(session = %id, product_id, theme = %r.theme, "Product page session created");
    Ok((StatusCode::CREATED, Json(CreatedProductPage { id, view })))
}

async fn show(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    Ok(respond(&s, &mut page).await)
}

async fn select_variant(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<VariantRequest>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.select_variant(&r.name, &r.value)?;
    Ok(respond(&s, &mut page).await)
}

async fn change_quantity(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<QuantityChange>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    match r {
        QuantityChange::Set(value) => page.set_quantity(value),
        QuantityChange::Increment => page.increment_quantity(),
        QuantityChange::Decrement => page.decrement_quantity(),
    }
    Ok(respond(&s, &mut page).await)
}

async fn select_tab(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<TabRequest>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.set_tab(r.tab)?;
    Ok(respond(&s, &mut page).await)
}

async fn change_image(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<ImageChange>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    match r {
        ImageChange::Select(index) => page.select_image(index)?,
        ImageChange::Next => page.next_image(),
        ImageChange::Previous => page.previous_image(),
    }
    Ok(respond(&s, &mut page).await)
}

async fn add_to_cart(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.add_to_cart(&*s.store).await?;
    Ok(respond(&s, &mut page).await)
}

async fn toggle_wishlist(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.toggle_wishlist(&*s.store).await?;
    Ok(respond(&s, &mut page).await)
}

async fn review_modal(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<ReviewModalRequest>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    if r.open { page.open_review_modal() } else { page.close_review_modal() }
    Ok(respond(&s, &mut page).await)
}

async fn submit_review(State(s): State<AppState>, Path(id): Path<Uuid>, Json(form): Json<ReviewForm>) -> Result<Json<ProductView>> {
    let session = s.products.get(id).await.ok_or_else(|| ApiError::session(id))?;
    let mut page = session.lock().await;
    page.set_review_form(form);
    page.submit_review(&*s.store).await?;
    Ok(respond(&s, &mut page).await)
}
