//! Integration tests for `HttpStoreClient` and the page controllers driven
//! through it.
//!
//! Uses `wiremock` to stand up a local store backend per test so no real
//! network traffic is made.

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_pages::domain::aggregates::{
    AddressPatch, CartItem, Checkout, PaymentMethod, PlacementOutcome, Product, ReviewForm, ShippingMethod, ShippingType,
    StoreContext,
};
use storefront_pages::domain::theme::Theme;
use storefront_pages::pages::{CheckoutPage, CheckoutPageError, NoticeLevel, ProductPage};
use storefront_pages::services::{
    CartContext, CouponRequest, HttpStoreClient, ServiceError, StoreApi, WishlistContext,
};

fn test_client(server: &MockServer) -> HttpStoreClient {
    HttpStoreClient::new(server.uri(), 5, Some("storefront-pages-test/0.1")).expect("failed to build test client")
}

fn coupon_request() -> CouponRequest {
    CouponRequest { store_id: 3, coupon_code: "SAVE5".into(), shipping_method_id: Some(1) }
}

fn checkout_page(server: &MockServer, payments: Vec<PaymentMethod>) -> CheckoutPage {
    let items = vec![CartItem {
        id: 10, name: "Diffuser".into(), price: Decimal::new(2500, 2), sale_price: None, cover_image: None,
        quantity: 2, stock: None, category: None,
    }];
    let methods = vec![ShippingMethod {
        id: 1, name: "Standard".into(), cost: Decimal::new(5, 0), handling_fee: Decimal::ZERO,
        min_order_amount: None, kind: ShippingType::FlatRate,
    }];
    let store = StoreContext::new(3, "aroma", server.uri());
    let checkout = Checkout::new(store, items, methods, payments, Decimal::ZERO).expect("non-empty cart");
    CheckoutPage::new(Theme::PerfumeFragrances, checkout, vec![], "csrf-token")
}

fn fill_and_advance(page: &mut CheckoutPage, method: PaymentMethod) {
    let checkout = page.checkout_mut();
    checkout
        .update_shipping(AddressPatch {
            first_name: Some("Ada".into()), last_name: Some("L".into()), email: Some("a@b.co".into()),
            phone: Some("5551234567".into()), street: Some("1 Loop Rd".into()), city: Some("Pune".into()),
            state: Some("MH".into()), zip: Some("411001".into()), country: Some("India".into()),
        })
        .unwrap();
    checkout.advance().unwrap();
    checkout.advance().unwrap();
    checkout.select_payment_method(method).unwrap();
}

fn product() -> Product {
    serde_json::from_value(json!({
        "id": 77, "name": "Desk Lamp", "price": "30.00", "stock": 12,
        "variants": [{"name": "Finish", "values": "Brass, Matte Black"}]
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Coupons
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validate_coupon_posts_request_and_parses_discount() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate"))
        .and(body_json(json!({"store_id": 3, "coupon_code": "SAVE5", "shipping_method_id": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true, "discount": "5.00", "message": "Saved!"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = test_client(&server).validate_coupon(&coupon_request()).await.unwrap();
    assert!(response.valid);
    assert_eq!(response.discount, Decimal::new(500, 2));
    assert_eq!(response.message.as_deref(), Some("Saved!"));
}

#[tokio::test]
async fn validate_coupon_treats_client_error_as_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "Coupon has expired"})))
        .mount(&server)
        .await;

    let response = test_client(&server).validate_coupon(&coupon_request()).await.unwrap();
    assert!(!response.valid);
    assert_eq!(response.message.as_deref(), Some("Coupon has expired"));
}

#[tokio::test]
async fn validate_coupon_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server).validate_coupon(&coupon_request()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 500, .. }), "got {err:?}");
    assert_eq!(err.user_message(), "Something went wrong. Please try again.");
}

#[tokio::test]
async fn checkout_page_applies_coupon_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true, "discount": "5.00"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut page = checkout_page(&server, vec![PaymentMethod::Cod]);
    assert!(page.apply_coupon(&client, "SAVE5").await.unwrap());
    let view = page.view();
    assert_eq!(view.summary.total, Decimal::new(5000, 2));
    assert_eq!(view.notices[0].level, NoticeLevel::Success);
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn states_and_cities_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/locations/states/101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"states": [{"id": 4008, "name": "Maharashtra"}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/locations/cities/4008"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cities": [{"id": 1, "name": "Pune"}, {"id": 2, "name": "Mumbai"}]})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let states = client.states(101).await.unwrap();
    assert_eq!(states[0].name, "Maharashtra");
    let cities = client.cities(4008).await.unwrap();
    assert_eq!(cities.len(), 2);
}

#[tokio::test]
async fn malformed_location_payload_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/locations/states/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = test_client(&server).states(1).await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Payment gateways
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_order_redirects_to_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store/aroma/payments/razorpay/create-order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "order_number": "ORD-1001"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut page = checkout_page(&server, vec![PaymentMethod::Razorpay]);
    fill_and_advance(&mut page, PaymentMethod::Razorpay);
    let outcome = page.place_order(&client).await.unwrap();
    assert_eq!(outcome, PlacementOutcome::Redirect { url: format!("{}/store/aroma/order-confirmation/ORD-1001", server.uri()) });
}

#[tokio::test]
async fn gateway_rejection_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store/aroma/payments/cashfree/create-order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Payment session expired"})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut page = checkout_page(&server, vec![PaymentMethod::Cashfree]);
    fill_and_advance(&mut page, PaymentMethod::Cashfree);
    let err = page.place_order(&client).await.unwrap_err();
    assert!(matches!(err, CheckoutPageError::Payment(ref m) if m == "Payment session expired"), "got {err:?}");
    assert_eq!(page.checkout().errors().get("general").map(String::as_str), Some("Payment session expired"));
}

// ---------------------------------------------------------------------------
// Cart, wishlist and reviews
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_to_cart_sends_selected_variants() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cart/add"))
        .and(body_json(json!({"product_id": 77, "quantity": 2, "variants": {"Finish": "Brass"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut page = ProductPage::new(Theme::FurnitureInterior, product(), "Guest");
    page.select_variant("Finish", "Brass").unwrap();
    page.set_quantity(2);
    assert!(page.add_to_cart(&client).await.unwrap());
}

#[tokio::test]
async fn cart_refusal_is_rejected_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cart/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Out of stock"})))
        .mount(&server)
        .await;

    let variants = [("Finish".to_string(), "Brass".to_string())].into_iter().collect();
    let err = test_client(&server).add_to_cart(&product(), &variants, 1).await.unwrap_err();
    assert_eq!(err.user_message(), "Out of stock");
}

#[tokio::test]
async fn wishlist_toggle_and_check() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/toggle"))
        .and(body_json(json!({"product_id": 77})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"in_wishlist": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wishlist/check/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"in_wishlist": false})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    assert!(!client.is_in_wishlist(77).await.unwrap());
    assert!(client.toggle_wishlist(77).await.unwrap());
}

#[tokio::test]
async fn submitted_review_updates_page_stats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reviews"))
        .and(body_json(json!({"product_id": 77, "rating": 4, "title": "Solid", "content": "Warm light"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "review": {
                "id": 12, "rating": 4, "title": "Solid", "content": "Warm light",
                "customer_name": "Ada", "created_at": "2026-01-05T10:00:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut page = ProductPage::new(Theme::FurnitureInterior, product(), "Guest");
    page.open_review_modal();
    page.set_review_form(ReviewForm { rating: 4, title: "Solid".into(), content: "Warm light".into() });
    assert!(page.submit_review(&client).await.unwrap());

    let view = page.view();
    assert_eq!(view.reviews.total_reviews, 1);
    assert_eq!(view.reviews.average_display, "4.0");
    assert_eq!(view.reviews.reviews[0].customer_name, "Ada");
    assert!(!view.review_modal_open);
}
