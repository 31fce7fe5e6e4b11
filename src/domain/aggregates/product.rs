//! Product detail view-model
//!
//! Products arrive from the backend with loosely shaped fields: `images` is a
//! comma-joined string, while `variants` and `custom_fields` may be JSON text,
//! arrays or objects. Everything is normalized here once, through typed parse
//! functions, so themes never deal with the raw shapes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::aggregates::cart::effective_price;
use crate::domain::aggregates::review::Review;
use crate::domain::theme::ThemeProfile;

/// Stock at or below this level is flagged as low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub variants: Value,
    #[serde(default)]
    pub custom_fields: Value,
    #[serde(default)]
    pub specifications: Value,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductTab {
    Description,
    Specifications,
    Details,
    CustomFields,
    Reviews,
}

/// Outcome of parsing one loosely shaped product field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldParse<T> {
    Parsed(Vec<T>),
    Absent,
    Malformed(String),
}

impl<T> FieldParse<T> {
    /// Degrades to an empty list, logging malformed input.
    pub fn into_vec(self, field: &str, product_id: u64) -> Vec<T> {
        match self {
            FieldParse::Parsed(items) => items,
            FieldParse::Absent => Vec::new(),
            FieldParse::Malformed(reason) => {
                tracing::warn!(product_id, field, %reason, "Ignoring malformed product field");
                Vec::new()
            }
        }
    }
}

/// Decodes JSON text in place; other shapes pass through.
fn unwrap_json_text(raw: &Value) -> Result<Option<Value>, String> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => serde_json::from_str(s).map(Some).map_err(|e| e.to_string()),
        other => Ok(Some(other.clone())),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn value_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => Ok(items.iter().map(value_text).filter(|s| !s.is_empty()).collect()),
        Value::String(s) => Ok(s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()),
        other => Err(format!("unsupported variant values: {other}")),
    }
}

/// Accepts `[{name, values}]`, `{name: values}` or either as JSON text.
pub fn parse_variants(raw: &Value) -> FieldParse<Variant> {
    let value = match unwrap_json_text(raw) {
        Ok(Some(v)) => v,
        Ok(None) => return FieldParse::Absent,
        Err(e) => return FieldParse::Malformed(e),
    };
    let parsed: Result<Vec<Variant>, String> = match &value {
        Value::Array(entries) => entries
            .iter()
            .map(|entry| {
                let name = entry.get("name").and_then(Value::as_str).ok_or("variant without a name")?;
                let values = value_list(entry.get("values").unwrap_or(&Value::Null))?;
                Ok(Variant { name: name.to_string(), values })
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(name, values)| Ok(Variant { name: name.clone(), values: value_list(values)? }))
            .collect(),
        other => Err(format!("unsupported variants shape: {other}")),
    };
    match parsed {
        Ok(variants) => {
            let variants: Vec<Variant> = variants.into_iter().filter(|v| !v.values.is_empty()).collect();
            if variants.is_empty() { FieldParse::Absent } else { FieldParse::Parsed(variants) }
        }
        Err(e) => FieldParse::Malformed(e),
    }
}

/// Accepts `[{name, value}]`, a plain `{name: value}` object or either as JSON text.
pub fn parse_custom_fields(raw: &Value) -> FieldParse<CustomField> {
    let value = match unwrap_json_text(raw) {
        Ok(Some(v)) => v,
        Ok(None) => return FieldParse::Absent,
        Err(e) => return FieldParse::Malformed(e),
    };
    let fields: Vec<CustomField> = match &value {
        Value::Array(entries) => {
            let mut fields = Vec::with_capacity(entries.len());
            for entry in entries {
                let Some(name) = entry.get("name").and_then(Value::as_str) else {
                    return FieldParse::Malformed("custom field without a name".into());
                };
                fields.push(CustomField { name: name.to_string(), value: value_text(entry.get("value").unwrap_or(&Value::Null)) });
            }
            fields
        }
        Value::Object(map) => map.iter().map(|(name, v)| CustomField { name: name.clone(), value: value_text(v) }).collect(),
        other => return FieldParse::Malformed(format!("unsupported custom fields shape: {other}")),
    };
    let fields: Vec<CustomField> = fields.into_iter().filter(|f| !f.name.trim().is_empty() && !f.value.is_empty()).collect();
    if fields.is_empty() { FieldParse::Absent } else { FieldParse::Parsed(fields) }
}

/// Ordered, deduplicated gallery: cover first, then the comma-joined list.
pub fn image_list(product: &Product, profile: &ThemeProfile) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let candidates = product
        .cover_image
        .iter()
        .map(String::as_str)
        .chain(product.images.as_deref().unwrap_or_default().split(','));
    for candidate in candidates {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !images.iter().any(|i| i == candidate) {
            images.push(candidate.to_string());
        }
    }
    if images.is_empty() {
        images.push(profile.placeholder_image(&product.name));
    }
    images
}

impl Product {
    pub fn effective_price(&self) -> Decimal { effective_price(self.price, self.sale_price) }
    pub fn is_on_sale(&self) -> bool { self.effective_price() < self.price }
    pub fn in_stock(&self) -> bool { self.stock > 0 }
    pub fn low_stock(&self) -> bool { self.in_stock() && self.stock <= LOW_STOCK_THRESHOLD }

    /// Whole-number percentage saved by the sale price.
    pub fn discount_percent(&self) -> u32 {
        if !self.is_on_sale() || self.price <= Decimal::ZERO {
            return 0;
        }
        ((self.price - self.effective_price()) / self.price * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .unwrap_or(0)
    }

    pub fn variant_list(&self) -> Vec<Variant> { parse_variants(&self.variants).into_vec("variants", self.id) }
    pub fn custom_field_list(&self) -> Vec<CustomField> { parse_custom_fields(&self.custom_fields).into_vec("custom_fields", self.id) }
    pub fn specification_list(&self) -> Vec<CustomField> { parse_custom_fields(&self.specifications).into_vec("specifications", self.id) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    #[error("unknown option {0}")]
    UnknownVariant(String),
    #[error("{value} is not available for {name}")]
    UnknownValue { name: String, value: String },
}

/// Chosen value per variant name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSelection(BTreeMap<String, String>);

impl VariantSelection {
    pub fn select(&mut self, variants: &[Variant], name: &str, value: &str) -> Result<(), VariantError> {
        let variant = variants.iter().find(|v| v.name == name).ok_or_else(|| VariantError::UnknownVariant(name.to_string()))?;
        if !variant.values.iter().any(|v| v == value) {
            return Err(VariantError::UnknownValue { name: name.to_string(), value: value.to_string() });
        }
        self.0.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> { self.0.get(name).map(String::as_str) }

    pub fn is_complete(&self, variants: &[Variant]) -> bool { variants.iter().all(|v| self.0.contains_key(&v.name)) }

    pub fn missing<'a>(&self, variants: &'a [Variant]) -> Vec<&'a str> {
        variants.iter().filter(|v| !self.0.contains_key(&v.name)).map(|v| v.name.as_str()).collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> { &self.0 }
}
