//! Order payload and payment dispatch
//!
//! The payload built at the end of checkout goes either to a gateway handler
//! (as JSON) or into a hidden form that the browser submits as a full-page
//! POST. Which path is taken depends only on the payment method.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::aggregates::cart::CartSummary;

/// Store the checkout belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreContext {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Storefront origin; hidden forms and confirmation links resolve against it.
    #[serde(skip)]
    pub base_url: String,
}

impl StoreContext {
    pub fn new(id: u64, slug: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { id, slug: slug.into(), name: None, base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url.trim_end_matches('/'), path) }

    pub fn order_place_url(&self) -> String { self.url(&format!("/store/{}/order/place", self.slug)) }

    pub fn confirmation_url(&self, order_number: &str) -> String {
        self.url(&format!("/store/{}/order-confirmation/{}", self.slug, urlencoding::encode(order_number)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind { Cashfree, Razorpay, Flutterwave }

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cashfree => "cashfree", Self::Razorpay => "razorpay", Self::Flutterwave => "flutterwave" }
    }
}

/// Payment method as enumerated by the store. Names match case-insensitively;
/// unknown ones (stripe, paypal, bank, ...) settle through the form POST path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PaymentMethod {
    Cod,
    Cashfree,
    Razorpay,
    Flutterwave,
    #[serde(rename = "whatsapp")]
    WhatsApp,
    #[serde(untagged)]
    Other(String),
}

impl PaymentMethod {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "cod" => Self::Cod,
            "cashfree" => Self::Cashfree,
            "razorpay" => Self::Razorpay,
            "flutterwave" => Self::Flutterwave,
            "whatsapp" => Self::WhatsApp,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cod => "cod",
            Self::Cashfree => "cashfree",
            Self::Razorpay => "razorpay",
            Self::Flutterwave => "flutterwave",
            Self::WhatsApp => "whatsapp",
            Self::Other(name) => name,
        }
    }

    pub fn gateway(&self) -> Option<GatewayKind> {
        match self {
            Self::Cashfree => Some(GatewayKind::Cashfree),
            Self::Razorpay => Some(GatewayKind::Razorpay),
            Self::Flutterwave => Some(GatewayKind::Flutterwave),
            _ => None,
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(name: String) -> Self { Self::parse(&name) }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer { pub first_name: String, pub last_name: String, pub email: String, pub phone: String }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address { pub street: String, pub city: String, pub state: String, pub zip: String, pub country: String }

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderPayload {
    pub store_id: u64,
    pub customer: Customer,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub shipping_method_id: Option<u64>,
    pub notes: String,
    pub coupon_code: Option<String>,
    pub whatsapp_number: Option<String>,
    pub summary: CartSummary,
}

impl OrderPayload {
    /// Flattened fields for the hidden form, CSRF token first.
    pub fn to_form_fields(&self, csrf_token: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = vec![
            ("_token".into(), csrf_token.to_string()),
            ("store_id".into(), self.store_id.to_string()),
            ("customer_first_name".into(), self.customer.first_name.clone()),
            ("customer_last_name".into(), self.customer.last_name.clone()),
            ("customer_email".into(), self.customer.email.clone()),
            ("customer_phone".into(), self.customer.phone.clone()),
        ];
        for (prefix, address) in [("shipping", &self.shipping_address), ("billing", &self.billing_address)] {
            fields.extend([
                (format!("{prefix}_address"), address.street.clone()),
                (format!("{prefix}_city"), address.city.clone()),
                (format!("{prefix}_state"), address.state.clone()),
                (format!("{prefix}_postal_code"), address.zip.clone()),
                (format!("{prefix}_country"), address.country.clone()),
            ]);
        }
        fields.push(("payment_method".into(), self.payment_method.to_string()));
        fields.push(("shipping_method_id".into(), self.shipping_method_id.map(|id| id.to_string()).unwrap_or_default()));
        fields.push(("notes".into(), self.notes.clone()));
        fields.push(("coupon_code".into(), self.coupon_code.clone().unwrap_or_default()));
        if let Some(number) = &self.whatsapp_number {
            fields.push(("whatsapp_number".into(), number.clone()));
        }
        fields
    }
}

/// How an order leaves the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentDispatch {
    Gateway(GatewayKind),
    FormPost,
}

impl PaymentDispatch {
    pub fn for_method(method: &PaymentMethod) -> Self {
        method.gateway().map_or(Self::FormPost, Self::Gateway)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HiddenForm {
    pub action: String,
    pub method: &'static str,
    pub fields: Vec<(String, String)>,
}

impl HiddenForm {
    pub fn post(action: String, fields: Vec<(String, String)>) -> Self { Self { action, method: "POST", fields } }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementOutcome {
    Redirect { url: String },
    SubmitForm { form: HiddenForm },
}
