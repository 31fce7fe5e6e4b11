//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::aggregates::checkout::CheckoutStep;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Checkout(CheckoutEvent),
    Product(ProductEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutEvent {
    StepChanged { from: CheckoutStep, to: CheckoutStep },
    CouponApplied { code: String, discount: Decimal },
    CouponRemoved { code: String },
    OrderPlaced { store_id: u64, payment_method: String, total: Decimal },
    PlacementFailed { store_id: u64, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    AddedToCart { product_id: u64, quantity: u32, variants: BTreeMap<String, String> },
    WishlistToggled { product_id: u64, in_wishlist: bool },
    ReviewSubmitted { product_id: u64, rating: u8 },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> String {
        let (aggregate, name) = match self {
            DomainEvent::Checkout(e) => ("checkout", match e {
                CheckoutEvent::StepChanged { .. } => "step_changed",
                CheckoutEvent::CouponApplied { .. } => "coupon_applied",
                CheckoutEvent::CouponRemoved { .. } => "coupon_removed",
                CheckoutEvent::OrderPlaced { .. } => "order_placed",
                CheckoutEvent::PlacementFailed { .. } => "placement_failed",
            }),
            DomainEvent::Product(e) => ("product", match e {
                ProductEvent::AddedToCart { .. } => "added_to_cart",
                ProductEvent::WishlistToggled { .. } => "wishlist_toggled",
                ProductEvent::ReviewSubmitted { .. } => "review_submitted",
            }),
        };
        format!("storefront.{aggregate}.{name}")
    }
}
