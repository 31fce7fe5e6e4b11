//! Aggregates module
pub mod cart;
pub mod checkout;
pub mod order;
pub mod product;
pub mod review;

pub use cart::{CartItem, CartSummary, ShippingMethod, ShippingType};
pub use checkout::{AddressForm, AddressPatch, AppliedCoupon, Checkout, CheckoutError, CheckoutStep, PlacementState};
pub use order::{GatewayKind, HiddenForm, OrderPayload, PaymentDispatch, PaymentMethod, PlacementOutcome, StoreContext};
pub use product::{CustomField, FieldParse, Product, ProductTab, Variant, VariantSelection};
pub use review::{Review, ReviewError, ReviewForm, ReviewStats};
