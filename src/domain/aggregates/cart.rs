//! Cart view-model: items, shipping methods and the recomputed summary

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Line supplied by the backend cart API; never mutated here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: u64,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

impl CartItem {
    pub fn effective_price(&self) -> Decimal { effective_price(self.price, self.sale_price) }
    pub fn line_total(&self) -> Decimal { self.effective_price() * Decimal::from(self.quantity) }
}

/// A sale price only counts when it is positive and actually lower.
pub fn effective_price(price: Decimal, sale_price: Option<Decimal>) -> Decimal {
    match sale_price {
        Some(sale) if sale > Decimal::ZERO && sale < price => sale,
        _ => price,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingType {
    FreeShipping,
    FlatRate,
    #[serde(untagged)]
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: u64,
    pub name: String,
    pub cost: Decimal,
    #[serde(default)]
    pub handling_fee: Decimal,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: ShippingType,
}

impl ShippingMethod {
    /// Shipping charged for a given cart subtotal.
    pub fn cost_for(&self, subtotal: Decimal) -> Decimal {
        if self.kind == ShippingType::FreeShipping {
            match self.min_order_amount {
                Some(min) if subtotal < min => {}
                _ => return Decimal::ZERO,
            }
        }
        self.cost + self.handling_fee
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartSummary {
    /// Client-side recomputation after a shipping or coupon change. Tax is the
    /// server's figure and is carried through untouched.
    pub fn compute(items: &[CartItem], shipping: Option<&ShippingMethod>, coupon_discount: Decimal, tax: Decimal) -> Self {
        let subtotal = items.iter().map(CartItem::line_total).sum::<Decimal>();
        let discount = coupon_discount.max(Decimal::ZERO).min(subtotal);
        let shipping = shipping.map(|m| m.cost_for(subtotal)).unwrap_or(Decimal::ZERO);
        let total = (subtotal - discount + shipping + tax).max(Decimal::ZERO);
        Self {
            subtotal: subtotal.round_dp(2),
            discount: discount.round_dp(2),
            shipping: shipping.round_dp(2),
            tax: tax.round_dp(2),
            total: total.round_dp(2),
        }
    }

    pub fn item_count(items: &[CartItem]) -> u32 { items.iter().map(|i| i.quantity).sum() }
}
