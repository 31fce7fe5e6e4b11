//! Page controllers
//!
//! One controller per page type. Every theme renders the same controller
//! state; only the [`ThemeProfile`](crate::domain::theme::ThemeProfile) differs.

pub mod checkout;
pub mod location;
pub mod notice;
pub mod product;

pub use checkout::{CheckoutPage, CheckoutPageError, CheckoutView, CouponCheck, Placement};
pub use location::{LocationCascade, LookupTicket};
pub use notice::{Notice, NoticeLevel, Notices};
pub use product::{ProductPage, ProductPageError, ProductView};
