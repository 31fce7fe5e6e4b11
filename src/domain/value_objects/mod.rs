//! Value Objects for the storefront pages

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Loose email shape check used by every checkout form.
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email pattern"));

/// WhatsApp numbers: optional leading `+`, then 10 to 15 digits.
pub static WHATSAPP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+]?[0-9]{10,15}$").expect("valid phone pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError { EmptyEmail, InvalidEmail, EmptyPhone, InvalidPhone, EmptyCoupon }

impl std::error::Error for ValueError {}
impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "Email is required"),
            Self::InvalidEmail => write!(f, "Email is invalid"),
            Self::EmptyPhone => write!(f, "WhatsApp number is required"),
            Self::InvalidPhone => write!(f, "Please enter a valid WhatsApp number (10-15 digits)"),
            Self::EmptyCoupon => write!(f, "Please enter a coupon code"),
        }
    }
}

/// Email address value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(value: &str) -> Result<Self, ValueError> {
        if value.is_empty() { return Err(ValueError::EmptyEmail); }
        if !EMAIL_RE.is_match(value) { return Err(ValueError::InvalidEmail); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

/// WhatsApp number, stored with whitespace stripped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsAppNumber(String);

impl WhatsAppNumber {
    pub fn parse(value: &str) -> Result<Self, ValueError> {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() { return Err(ValueError::EmptyPhone); }
        if !WHATSAPP_RE.is_match(&compact) { return Err(ValueError::InvalidPhone); }
        Ok(Self(compact))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for WhatsAppNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Coupon code as typed by the shopper, trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn parse(value: &str) -> Result<Self, ValueError> {
        let value = value.trim();
        if value.is_empty() { return Err(ValueError::EmptyCoupon); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Purchase quantity, never below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    /// Clamps into `1..=max`; a `max` of zero still yields one.
    pub fn new(value: u32, max: u32) -> Self { Self(value.clamp(1, max.max(1))) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn increment(&self, max: u32) -> Self { Self::new(self.0.saturating_add(1), max) }
    pub fn decrement(&self) -> Self { Self(self.0.saturating_sub(1).max(1)) }
}

impl Default for Quantity { fn default() -> Self { Self(1) } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert_eq!(EmailAddress::parse("not-an-email"), Err(ValueError::InvalidEmail));
        assert_eq!(EmailAddress::parse(""), Err(ValueError::EmptyEmail));
        assert_eq!(EmailAddress::parse("a@b.co").unwrap().as_str(), "a@b.co");
    }

    #[test]
    fn test_whatsapp_number() {
        assert_eq!(WhatsAppNumber::parse("12345"), Err(ValueError::InvalidPhone));
        assert_eq!(WhatsAppNumber::parse("+15551234567").unwrap().as_str(), "+15551234567");
        assert_eq!(WhatsAppNumber::parse("+1 555 123 4567").unwrap().as_str(), "+15551234567");
        assert_eq!(WhatsAppNumber::parse("  "), Err(ValueError::EmptyPhone));
        assert!(WhatsAppNumber::parse("1234567890123456").is_err());
    }

    #[test]
    fn test_coupon_trimmed() {
        assert_eq!(CouponCode::parse("  SAVE10 ").unwrap().as_str(), "SAVE10");
        assert_eq!(CouponCode::parse("   "), Err(ValueError::EmptyCoupon));
    }

    #[test]
    fn test_quantity_bounds() {
        let q = Quantity::new(3, 3);
        assert_eq!(q.increment(3).value(), 3);
        assert_eq!(Quantity::default().decrement().value(), 1);
        assert_eq!(Quantity::new(0, 10).value(), 1);
        assert_eq!(Quantity::new(5, 0).value(), 1);
    }
}
