//! Product page controller
//!
//! Holds the per-visitor UI state of a product detail page (gallery, variant
//! picker, quantity, tabs, review modal) and drives the cart, wishlist and
//! review collaborators.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::notice::{Notice, Notices};
use crate::domain::aggregates::product::{image_list, VariantError};
use crate::domain::aggregates::{
    CustomField, Product, ProductTab, Review, ReviewError, ReviewForm, ReviewStats, Variant, VariantSelection,
};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::theme::{Theme, ThemeProfile};
use crate::domain::value_objects::Quantity;
use crate::domain::FieldErrors;
use crate::services::{CartContext, ReviewRequest, StoreApi, WishlistContext};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProductPageError {
    #[error("select {}", .0.join(", "))]
    IncompleteVariants(Vec<String>),
    #[error("product is out of stock")]
    OutOfStock,
    #[error(transparent)]
    Variant(#[from] VariantError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("tab {0:?} is not shown by this theme")]
    TabUnavailable(ProductTab),
    #[error("image {0} does not exist")]
    ImageOutOfRange(usize),
    #[error("another request is still in progress")]
    Busy,
}

#[derive(Debug)]
pub struct ProductPage {
    profile: ThemeProfile,
    product: Product,
    images: Vec<String>,
    variants: Vec<Variant>,
    custom_fields: Vec<CustomField>,
    specifications: Vec<CustomField>,
    selected_image: usize,
    selection: VariantSelection,
    quantity: Quantity,
    active_tab: ProductTab,
    review_modal_open: bool,
    review_form: ReviewForm,
    review_errors: FieldErrors,
    reviews: ReviewStats,
    customer_name: String,
    cart_loading: bool,
    wishlist_loading: bool,
    submitting_review: bool,
    in_wishlist: bool,
    notices: Notices,
    events: Vec<DomainEvent>,
}

#[derive(Debug, Serialize)]
pub struct ReviewSummaryView {
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub average_display: String,
    pub total_reviews: u32,
    pub breakdown: [(u8, u32); 5],
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub theme: ThemeProfile,
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub effective_price: Decimal,
    pub on_sale: bool,
    pub discount_percent: u32,
    pub stock: u32,
    pub in_stock: bool,
    pub low_stock: bool,
    pub images: Vec<String>,
    pub selected_image: usize,
    pub variants: Vec<Variant>,
    pub selection: BTreeMap<String, String>,
    pub missing_variants: Vec<String>,
    pub quantity: u32,
    pub can_add_to_cart: bool,
    pub tabs: Vec<ProductTab>,
    pub active_tab: ProductTab,
    pub custom_fields: Vec<CustomField>,
    pub specifications: Vec<CustomField>,
    pub reviews: ReviewSummaryView,
    pub review_modal_open: bool,
    pub review_form: ReviewForm,
    pub review_errors: FieldErrors,
    pub cart_loading: bool,
    pub wishlist_loading: bool,
    pub submitting_review: bool,
    pub in_wishlist: bool,
    pub notices: Vec<Notice>,
}

impl ProductPage {
    /// `customer_name` labels reviews the server accepts without echoing back.
    pub fn new(theme: Theme, product: Product, customer_name: impl Into<String>) -> Self {
        let profile = theme.profile();
        let images = image_list(&product, &profile);
        let variants = product.variant_list();
        let custom_fields = product.custom_field_list();
        let specifications = product.specification_list();
        let reviews = ReviewStats::new(product.reviews.clone(), product.average_rating, product.total_reviews);
        let active_tab = profile.product_tabs.first().copied().unwrap_or(ProductTab::Description);
        Self {
            profile,
            product,
            images,
            variants,
            custom_fields,
            specifications,
            selected_image: 0,
            selection: VariantSelection::default(),
            quantity: Quantity::default(),
            active_tab,
            review_modal_open: false,
            review_form: ReviewForm::default(),
            review_errors: FieldErrors::new(),
            reviews,
            customer_name: customer_name.into(),
            cart_loading: false,
            wishlist_loading: false,
            submitting_review: false,
            in_wishlist: false,
            notices: Notices::default(),
            events: Vec::new(),
        }
    }

    pub fn product(&self) -> &Product { &self.product }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn selected_image(&self) -> usize { self.selected_image }
    pub fn selection(&self) -> &VariantSelection { &self.selection }
    pub fn quantity(&self) -> u32 { self.quantity.value() }
    pub fn active_tab(&self) -> ProductTab { self.active_tab }
    pub fn in_wishlist(&self) -> bool { self.in_wishlist }
    pub fn reviews(&self) -> &ReviewStats { &self.reviews }
    pub fn review_modal_open(&self) -> bool { self.review_modal_open }
    pub fn notices(&self) -> &[Notice] { self.notices.pending() }
    pub fn take_notices(&mut self) -> Vec<Notice> { self.notices.take() }
    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    pub fn select_image(&mut self, index: usize) -> Result<(), ProductPageError> {
        if index >= self.images.len() {
            return Err(ProductPageError::ImageOutOfRange(index));
        }
        self.selected_image = index;
        Ok(())
    }

    pub fn next_image(&mut self) { self.selected_image = (self.selected_image + 1) % self.images.len().max(1); }

    pub fn previous_image(&mut self) {
        let count = self.images.len().max(1);
        self.selected_image = (self.selected_image + count - 1) % count;
    }

    pub fn select_variant(&mut self, name: &str, value: &str) -> Result<(), ProductPageError> {
        self.selection.select(&self.variants, name, value)?;
        Ok(())
    }

    /// Quantity is kept within `1..=stock`.
    pub fn set_quantity(&mut self, value: u32) { self.quantity = Quantity::new(value, self.product.stock); }
    pub fn increment_quantity(&mut self) { self.quantity = self.quantity.increment(self.product.stock); }
    pub fn decrement_quantity(&mut self) { self.quantity = self.quantity.decrement(); }

    pub fn set_tab(&mut self, tab: ProductTab) -> Result<(), ProductPageError> {
        if !self.profile.shows(tab) {
            return Err(ProductPageError::TabUnavailable(tab));
        }
        self.active_tab = tab;
        Ok(())
    }

    fn missing_variants(&self) -> Vec<String> {
        self.selection.missing(&self.variants).into_iter().map(String::from).collect()
    }

    pub fn can_add_to_cart(&self) -> bool {
        self.product.in_stock() && self.selection.is_complete(&self.variants) && !self.cart_loading
    }

    /// Returns whether the cart accepted the item; refusals become notices.
    pub async fn add_to_cart<C: CartContext>(&mut self, cart: &C) -> Result<bool, ProductPageError> {
        if !self.product.in_stock() {
            return Err(ProductPageError::OutOfStock);
        }
        let missing = self.missing_variants();
        if !missing.is_empty() {
            return Err(ProductPageError::IncompleteVariants(missing));
        }
        if self.cart_loading {
            return Err(ProductPageError::Busy);
        }

        let quantity = self.quantity.value();
        self.cart_loading = true;
        let result = cart.add_to_cart(&self.product, self.selection.as_map(), quantity).await;
        self.cart_loading = false;

        match result {
            Ok(()) => {
                self.notices.success(format!("{} added to cart", self.product.name));
                self.events.push(DomainEvent::Product(ProductEvent::AddedToCart {
                    product_id: self.product.id,
                    quantity,
                    variants: self.selection.as_map().clone(),
                }));
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(product_id = self.product.id, error = %e, "Add to cart failed");
                self.notices.error(e.user_message());
                Ok(false)
            }
        }
    }

    /// Loads the initial wishlist flag; failures leave it unset.
    pub async fn sync_wishlist<W: WishlistContext>(&mut self, wishlist: &W) {
        match wishlist.is_in_wishlist(self.product.id).await {
            Ok(in_wishlist) => self.in_wishlist = in_wishlist,
            Err(e) => tracing::debug!(product_id = self.product.id, error = %e, "Wishlist check failed"),
        }
    }

    pub async fn toggle_wishlist<W: WishlistContext>(&mut self, wishlist: &W) -> Result<bool, ProductPageError> {
        if self.wishlist_loading {
            return Err(ProductPageError::Busy);
        }
        self.wishlist_loading = true;
        let result = wishlist.toggle_wishlist(self.product.id).await;
        self.wishlist_loading = false;

        match result {
            Ok(in_wishlist) => {
                self.in_wishlist = in_wishlist;
                self.notices.success(if in_wishlist { "Added to wishlist" } else { "Removed from wishlist" });
                self.events.push(DomainEvent::Product(ProductEvent::WishlistToggled { product_id: self.product.id, in_wishlist }));
                Ok(in_wishlist)
            }
            Err(e) => {
                tracing::warn!(product_id = self.product.id, error = %e, "Wishlist toggle failed");
                self.notices.error(e.user_message());
                Ok(self.in_wishlist)
            }
        }
    }

    pub fn open_review_modal(&mut self) { self.review_modal_open = true; }

    pub fn close_review_modal(&mut self) {
        self.review_modal_open = false;
        self.review_errors.clear();
    }

    pub fn set_review_form(&mut self, form: ReviewForm) { self.review_form = form; }

    /// Submits the modal's form. Invalid input is returned as field errors;
    /// a refused or failed submission becomes an error notice.
    pub async fn submit_review<S: StoreApi>(&mut self, api: &S) -> Result<bool, ProductPageError> {
        if self.submitting_review {
            return Err(ProductPageError::Busy);
        }
        if let Err(ReviewError::Invalid(errors)) = self.review_form.check() {
            self.review_errors = errors.clone();
            return Err(ReviewError::Invalid(errors).into());
        }
        self.review_errors.clear();

        let request = ReviewRequest {
            product_id: self.product.id,
            rating: self.review_form.rating,
            title: self.review_form.title.trim().to_string(),
            content: self.review_form.content.trim().to_string(),
        };
        self.submitting_review = true;
        let result = api.submit_review(&request).await;
        self.submitting_review = false;

        match result {
            Ok(response) if response.success => {
                let review = response.review.unwrap_or_else(|| self.review_form.to_review(&self.customer_name));
                self.reviews.record(review);
                self.review_form = ReviewForm::default();
                self.review_modal_open = false;
                self.notices.success(response.message.unwrap_or_else(|| "Thank you for your review!".to_string()));
                self.events.push(DomainEvent::Product(ProductEvent::ReviewSubmitted { product_id: self.product.id, rating: request.rating }));
                Ok(true)
            }
            Ok(response) => {
                self.notices.error(response.message.unwrap_or_else(|| "Failed to submit review".to_string()));
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(product_id = self.product.id, error = %e, "Review submission failed");
                self.notices.error(e.user_message());
                Ok(false)
            }
        }
    }

    pub fn view(&self) -> ProductView {
        let product = &self.product;
        ProductView {
            theme: self.profile.clone(),
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            sku: product.sku.clone(),
            category: product.category.clone(),
            price: product.price,
            effective_price: product.effective_price(),
            on_sale: product.is_on_sale(),
            discount_percent: product.discount_percent(),
            stock: product.stock,
            in_stock: product.in_stock(),
            low_stock: product.low_stock(),
            images: self.images.clone(),
            selected_image: self.selected_image,
            variants: self.variants.clone(),
            selection: self.selection.as_map().clone(),
            missing_variants: self.missing_variants(),
            quantity: self.quantity.value(),
            can_add_to_cart: self.can_add_to_cart(),
            tabs: self.profile.product_tabs.clone(),
            active_tab: self.active_tab,
            custom_fields: self.custom_fields.clone(),
            specifications: self.specifications.clone(),
            reviews: ReviewSummaryView {
                reviews: self.reviews.reviews.clone(),
                average_rating: self.reviews.average_rating,
                average_display: self.reviews.average_display(),
                total_reviews: self.reviews.total_reviews,
                breakdown: self.reviews.rating_breakdown(),
            },
            review_modal_open: self.review_modal_open,
            review_form: self.review_form.clone(),
            review_errors: self.review_errors.clone(),
            cart_loading: self.cart_loading,
            wishlist_loading: self.wishlist_loading,
            submitting_review: self.submitting_review,
            in_wishlist: self.in_wishlist,
            notices: self.notices.pending().to_vec(),
        }
    }
}
