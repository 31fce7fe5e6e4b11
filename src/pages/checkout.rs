//! Checkout page controller
//!
//! Wraps the [`Checkout`] wizard with the async work a page performs: coupon
//! validation, the location cascade and payment dispatch. Collaborators are
//! passed per call so the controller itself stays plain data.

use rust_decimal::Decimal;
use serde::Serialize;

use super::location::{LocationCascade, LookupTicket};
use super::notice::{Notice, Notices};
use crate::domain::aggregates::{
    AddressForm, AppliedCoupon, CartItem, CartSummary, Checkout, CheckoutError, CheckoutStep, GatewayKind, HiddenForm,
    OrderPayload, PaymentDispatch, PaymentMethod, PlacementOutcome, PlacementState, ShippingMethod,
};
use crate::domain::events::DomainEvent;
use crate::domain::theme::{Theme, ThemeProfile};
use crate::domain::value_objects::CouponCode;
use crate::domain::FieldErrors;
use crate::services::{CouponRequest, CouponResponse, Location, OrderConfirmation, PaymentGateway, ServiceError, StoreApi};

#[derive(Debug, thiserror::Error)]
pub enum CheckoutPageError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error("unknown {kind} {id}")]
    UnknownLocation { kind: &'static str, id: u64 },
    #[error("payment failed: {0}")]
    Payment(String),
}

/// First half of a placement: either finished already or waiting on a gateway.
#[derive(Debug)]
pub enum Placement {
    Ready(PlacementOutcome),
    AwaitGateway { gateway: GatewayKind, payload: OrderPayload },
}

/// A coupon validation waiting on the store.
#[derive(Debug)]
pub struct CouponCheck {
    code: CouponCode,
    pub request: CouponRequest,
}

#[derive(Debug)]
pub struct CheckoutPage {
    theme: Theme,
    checkout: Checkout,
    locations: LocationCascade,
    notices: Notices,
    csrf_token: String,
    applying_coupon: bool,
}

#[derive(Debug, Serialize)]
pub struct ShippingMethodView {
    #[serde(flatten)]
    pub method: ShippingMethod,
    /// Cost for the current subtotal, after the free-shipping rule.
    pub charged: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub theme: ThemeProfile,
    pub step: CheckoutStep,
    pub step_index: usize,
    pub step_label: &'static str,
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub summary: CartSummary,
    pub shipping: AddressForm,
    pub billing: AddressForm,
    pub billing_same_as_shipping: bool,
    pub shipping_methods: Vec<ShippingMethodView>,
    pub shipping_method_id: Option<u64>,
    pub payment_methods: Vec<PaymentMethod>,
    pub payment_method: Option<PaymentMethod>,
    pub whatsapp_number: String,
    pub coupon: Option<AppliedCoupon>,
    pub applying_coupon: bool,
    pub notes: String,
    pub locations: LocationCascade,
    pub errors: FieldErrors,
    pub placement: PlacementState,
    pub notices: Vec<Notice>,
}

impl CheckoutPage {
    pub fn new(theme: Theme, checkout: Checkout, countries: Vec<Location>, csrf_token: impl Into<String>) -> Self {
        Self {
            theme,
            checkout,
            locations: LocationCascade::new(countries),
            notices: Notices::default(),
            csrf_token: csrf_token.into(),
            applying_coupon: false,
        }
    }

    pub fn theme(&self) -> Theme { self.theme }
    pub fn checkout(&self) -> &Checkout { &self.checkout }
    pub fn checkout_mut(&mut self) -> &mut Checkout { &mut self.checkout }
    pub fn locations(&self) -> &LocationCascade { &self.locations }
    pub fn notices(&self) -> &[Notice] { self.notices.pending() }
    pub fn csrf_token(&self) -> &str { &self.csrf_token }

    /// Resolves against the country list. Stores without a country list
    /// accept any id and keep the typed country name.
    pub fn begin_country(&mut self, country_id: u64) -> Result<LookupTicket, CheckoutPageError> {
        let name = match self.locations.country(country_id) {
            Some(country) => country.name.clone(),
            None if self.locations.countries.is_empty() => self.checkout.shipping_form().country.clone(),
            None => return Err(CheckoutPageError::UnknownLocation { kind: "country", id: country_id }),
        };
        self.checkout.set_country(country_id, &name)?;
        Ok(self.locations.begin_states())
    }

    pub fn finish_states(&mut self, ticket: LookupTicket, result: Result<Vec<Location>, ServiceError>) -> bool {
        self.locations.finish_states(ticket, result)
    }

    pub async fn select_country<S: StoreApi>(&mut self, api: &S, country_id: u64) -> Result<(), CheckoutPageError> {
        let ticket = self.begin_country(country_id)?;
        let result = api.states(country_id).await;
        self.finish_states(ticket, result);
        Ok(())
    }

    /// States must come from the loaded list; while it is empty or loading
    /// every id is unknown and the typed state is left alone.
    pub fn begin_state(&mut self, state_id: u64) -> Result<LookupTicket, CheckoutPageError> {
        let name = self
            .locations
            .state(state_id)
            .map(|s| s.name.clone())
            .ok_or(CheckoutPageError::UnknownLocation { kind: "state", id: state_id })?;
        self.checkout.set_state(state_id, &name)?;
        Ok(self.locations.begin_cities())
    }

    pub fn finish_cities(&mut self, ticket: LookupTicket, result: Result<Vec<Location>, ServiceError>) -> bool {
        self.locations.finish_cities(ticket, result)
    }

    pub async fn select_state<S: StoreApi>(&mut self, api: &S, state_id: u64) -> Result<(), CheckoutPageError> {
        let ticket = self.begin_state(state_id)?;
        let result = api.cities(state_id).await;
        self.finish_cities(ticket, result);
        Ok(())
    }

    pub fn select_city(&mut self, city_id: u64) -> Result<(), CheckoutPageError> {
        let name = self
            .locations
            .city(city_id)
            .map(|c| c.name.clone())
            .ok_or(CheckoutPageError::UnknownLocation { kind: "city", id: city_id })?;
        self.checkout.set_city(city_id, &name)?;
        Ok(())
    }

    /// Checks the code locally and marks the coupon as in flight. `None`
    /// means nothing needs sending; the reason is already a notice.
    pub fn begin_coupon(&mut self, code: &str) -> Result<Option<CouponCheck>, CheckoutPageError> {
        self.checkout.ensure_editable()?;
        if self.applying_coupon {
            self.notices.info("A coupon is already being checked");
            return Ok(None);
        }
        let code = match CouponCode::parse(code) {
            Ok(code) => code,
            Err(e) => {
                self.notices.error(e.to_string());
                return Ok(None);
            }
        };
        let request = CouponRequest {
            store_id: self.checkout.store().id,
            coupon_code: code.to_string(),
            shipping_method_id: self.checkout.shipping_method_id(),
        };
        self.applying_coupon = true;
        Ok(Some(CouponCheck { code, request }))
    }

    /// Applies the store's answer. Rejections become error notices; the
    /// return value tells whether a discount is now applied.
    pub fn finish_coupon(&mut self, check: CouponCheck, result: Result<CouponResponse, ServiceError>) -> Result<bool, CheckoutPageError> {
        self.applying_coupon = false;
        match result {
            Ok(response) if response.valid => {
                self.checkout.apply_coupon(check.code, response.discount)?;
                self.notices.success(response.message.unwrap_or_else(|| "Coupon applied successfully".to_string()));
                Ok(true)
            }
            Ok(response) => {
                self.notices.error(response.message.unwrap_or_else(|| "Invalid coupon code".to_string()));
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(store_id = check.request.store_id, error = %e, "Coupon validation failed");
                self.notices.error(e.user_message());
                Ok(false)
            }
        }
    }

    pub async fn apply_coupon<S: StoreApi>(&mut self, api: &S, code: &str) -> Result<bool, CheckoutPageError> {
        let Some(check) = self.begin_coupon(code)? else { return Ok(false) };
        let result = api.validate_coupon(&check.request).await;
        self.finish_coupon(check, result)
    }

    pub fn remove_coupon(&mut self) -> Result<(), CheckoutPageError> {
        if self.checkout.coupon().is_some() {
            self.checkout.remove_coupon()?;
            self.notices.info("Coupon removed");
        }
        Ok(())
    }

    /// Validates and locks the checkout. Form-POST methods finish here;
    /// gateway methods must be completed with [`CheckoutPage::finish_gateway`].
    pub fn begin_placement(&mut self) -> Result<Placement, CheckoutPageError> {
        let payload = self.checkout.begin_placement()?;
        match PaymentDispatch::for_method(&payload.payment_method) {
            PaymentDispatch::Gateway(gateway) => Ok(Placement::AwaitGateway { gateway, payload }),
            PaymentDispatch::FormPost => {
                let form = HiddenForm::post(self.checkout.store().order_place_url(), payload.to_form_fields(&self.csrf_token));
                self.checkout.complete_placement(Ok(()))?;
                Ok(Placement::Ready(PlacementOutcome::SubmitForm { form }))
            }
        }
    }

    pub fn finish_gateway(&mut self, result: Result<OrderConfirmation, ServiceError>) -> Result<PlacementOutcome, CheckoutPageError> {
        match result {
            Ok(confirmation) => {
                self.checkout.complete_placement(Ok(()))?;
                let url = confirmation
                    .redirect_url
                    .unwrap_or_else(|| self.checkout.store().confirmation_url(&confirmation.order_number));
                tracing::info!(store_id = self.checkout.store().id, order_number = %confirmation.order_number, "Order placed");
                Ok(PlacementOutcome::Redirect { url })
            }
            Err(e) => {
                tracing::warn!(store_id = self.checkout.store().id, error = %e, "Gateway order placement failed");
                let message = e.user_message();
                self.checkout.complete_placement(Err(message.clone()))?;
                Err(CheckoutPageError::Payment(message))
            }
        }
    }

    pub async fn place_order<G: PaymentGateway>(&mut self, gateway: &G) -> Result<PlacementOutcome, CheckoutPageError> {
        match self.begin_placement()? {
            Placement::Ready(outcome) => Ok(outcome),
            Placement::AwaitGateway { gateway: kind, payload } => {
                let result = gateway.handle_order_placement(kind, &payload, self.checkout.store()).await;
                self.finish_gateway(result)
            }
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> { self.notices.take() }
    pub fn take_events(&mut self) -> Vec<DomainEvent> { self.checkout.take_events() }

    /// Snapshot for the theme to render, pending notices included.
    pub fn view(&self) -> CheckoutView {
        let summary = self.checkout.summary();
        let step = self.checkout.step();
        let profile = self.theme.profile();
        let step_label = profile.step_labels[step.index()];
        CheckoutView {
            step,
            step_index: step.index(),
            step_label,
            theme: profile,
            items: self.checkout.items().to_vec(),
            item_count: CartSummary::item_count(self.checkout.items()),
            shipping: self.checkout.shipping_form().clone(),
            billing: self.checkout.billing_form().clone(),
            billing_same_as_shipping: self.checkout.billing_same_as_shipping(),
            shipping_methods: self
                .checkout
                .shipping_methods()
                .iter()
                .map(|m| ShippingMethodView { charged: m.cost_for(summary.subtotal), method: m.clone() })
                .collect(),
            shipping_method_id: self.checkout.shipping_method_id(),
            payment_methods: self.checkout.payment_methods().to_vec(),
            payment_method: self.checkout.payment_method().cloned(),
            whatsapp_number: self.checkout.whatsapp_number().to_string(),
            coupon: self.checkout.coupon().cloned(),
            applying_coupon: self.applying_coupon,
            notes: self.checkout.notes().to_string(),
            locations: self.locations.clone(),
            errors: self.checkout.errors().clone(),
            placement: self.checkout.placement(),
            notices: self.notices.pending().to_vec(),
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{AddressPatch, ShippingType, StoreContext};
    use crate::pages::notice::NoticeLevel;
    use crate::services::{ReviewRequest, ReviewResponse};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        coupon: Option<CouponResponse>,
        coupon_requests: Mutex<Vec<CouponRequest>>,
    }

    impl StoreApi for FakeStore {
        async fn validate_coupon(&self, request: &CouponRequest) -> Result<CouponResponse, ServiceError> {
            self.coupon_requests.lock().unwrap().push(request.clone());
            self.coupon.clone().ok_or(ServiceError::Status { status: 503, body: String::new() })
        }
        async fn states(&self, country_id: u64) -> Result<Vec<Location>, ServiceError> {
            match country_id {
                1 => Ok(vec![Location { id: 10, name: "Goa".into() }]),
                _ => Err(ServiceError::Rejected("lookup down".into())),
            }
        }
        async fn cities(&self, _state_id: u64) -> Result<Vec<Location>, ServiceError> {
            Ok(vec![Location { id: 100, name: "Panaji".into() }])
        }
        async fn submit_review(&self, _request: &ReviewRequest) -> Result<ReviewResponse, ServiceError> {
            unreachable!("checkout never submits reviews")
        }
    }

    struct FakeGateway(Result<OrderConfirmation, String>);

    impl PaymentGateway for FakeGateway {
        async fn handle_order_placement(
            &self,
            _gateway: GatewayKind,
            _payload: &OrderPayload,
            _store: &StoreContext,
        ) -> Result<OrderConfirmation, ServiceError> {
            self.0.clone().map_err(ServiceError::Rejected)
        }
    }

    fn page() -> CheckoutPage {
        let items = vec![CartItem {
            id: 1, name: "Oud Intense".into(), price: Decimal::new(40, 0), sale_price: None, cover_image: None,
            quantity: 1, stock: None, category: None,
        }];
        let methods = vec![ShippingMethod {
            id: 5, name: "Express".into(), cost: Decimal::new(8, 0), handling_fee: Decimal::new(2, 0),
            min_order_amount: Some(Decimal::new(50, 0)), kind: ShippingType::FreeShipping,
        }];
        let payments = vec![PaymentMethod::Cod, PaymentMethod::Cashfree];
        let checkout = Checkout::new(StoreContext::new(11, "scent-lab", "https://shop.test"), items, methods, payments, Decimal::ZERO).unwrap();
        let countries = vec![Location { id: 1, name: "India".into() }, Location { id: 2, name: "Kenya".into() }];
        CheckoutPage::new(Theme::PerfumeFragrances, checkout, countries, "csrf-123")
    }

    fn ready_to_pay(page: &mut CheckoutPage, method: PaymentMethod) {
        let c = page.checkout_mut();
        c.update_shipping(AddressPatch {
            first_name: Some("Ada".into()), last_name: Some("L".into()), email: Some("a@b.co".into()), phone: Some("5551234567".into()),
            street: Some("1 Loop Rd".into()), city: Some("Panaji".into()), state: Some("Goa".into()), zip: Some("403001".into()),
            country: Some("India".into()),
        }).unwrap();
        c.advance().unwrap();
        c.advance().unwrap();
        c.select_payment_method(method).unwrap();
    }

    #[tokio::test]
    async fn test_coupon_applied_and_reflected_in_summary() {
        let store = FakeStore {
            coupon: Some(CouponResponse { valid: true, discount: Decimal::new(10, 0), message: None }),
            ..FakeStore::default()
        };
        let mut page = page();
        assert!(page.apply_coupon(&store, " WELCOME10 ").await.unwrap());
        let request = store.coupon_requests.lock().unwrap()[0].clone();
        assert_eq!(request, CouponRequest { store_id: 11, coupon_code: "WELCOME10".into(), shipping_method_id: Some(5) });

        let view = page.view();
        assert_eq!(view.summary.discount, Decimal::new(10, 0));
        assert_eq!(view.summary.total, Decimal::new(40, 0));
        assert_eq!(view.notices[0].level, NoticeLevel::Success);

        page.remove_coupon().unwrap();
        assert_eq!(page.view().summary.total, Decimal::new(50, 0));
    }

    #[tokio::test]
    async fn test_coupon_rejection_becomes_error_notice() {
        let store = FakeStore {
            coupon: Some(CouponResponse { valid: false, discount: Decimal::ZERO, message: Some("Coupon expired".into()) }),
            ..FakeStore::default()
        };
        let mut page = page();
        assert!(!page.apply_coupon(&store, "OLD").await.unwrap());
        assert_eq!(page.notices()[0].message, "Coupon expired");
        assert!(page.checkout().coupon().is_none());
    }

    #[tokio::test]
    async fn test_empty_coupon_makes_no_request() {
        let store = FakeStore::default();
        let mut page = page();
        assert!(!page.apply_coupon(&store, "  ").await.unwrap());
        assert!(store.coupon_requests.lock().unwrap().is_empty());
        assert_eq!(page.notices()[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_coupon_transport_failure_is_notice() {
        let store = FakeStore::default();
        let mut page = page();
        assert!(!page.apply_coupon(&store, "ANY").await.unwrap());
        assert_eq!(page.notices()[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_location_cascade() {
        let store = FakeStore::default();
        let mut page = page();
        page.select_country(&store, 1).await.unwrap();
        assert_eq!(page.checkout().shipping_form().country, "India");
        assert_eq!(page.locations().states.len(), 1);
        page.select_state(&store, 10).await.unwrap();
        page.select_city(100).unwrap();
        assert_eq!(page.checkout().shipping_form().city, "Panaji");

        page.select_country(&store, 2).await.unwrap();
        assert!(page.locations().states.is_empty());
        assert!(page.locations().cities.is_empty());
        assert!(!page.locations().loading_states);
        assert!(page.checkout().shipping_form().city.is_empty());

        assert!(matches!(page.select_country(&store, 99).await, Err(CheckoutPageError::UnknownLocation { .. })));
    }

    #[tokio::test]
    async fn test_state_and_city_need_a_loaded_list() {
        let store = FakeStore::default();
        let mut page = page();

        // Country 2 has no working state lookup, so the list stays empty.
        page.select_country(&store, 2).await.unwrap();
        page.checkout_mut()
            .update_shipping(AddressPatch { state: Some("Maharashtra".into()), city: Some("Pune".into()), ..AddressPatch::default() })
            .unwrap();
        let err = page.select_state(&store, 987654).await.unwrap_err();
        assert!(matches!(err, CheckoutPageError::UnknownLocation { kind: "state", id: 987654 }));
        assert!(matches!(page.select_city(1), Err(CheckoutPageError::UnknownLocation { kind: "city", .. })));

        let shipping = page.checkout().shipping_form();
        assert_eq!(shipping.state, "Maharashtra");
        assert_eq!(shipping.state_id, None);
        assert_eq!(shipping.city, "Pune");
        assert!(!page.locations().loading_cities);
    }

    #[tokio::test]
    async fn test_country_without_list_keeps_typed_name() {
        let store = FakeStore::default();
        let checkout = page().checkout().clone();
        let mut page = CheckoutPage::new(Theme::PerfumeFragrances, checkout, vec![], "csrf-123");
        page.checkout_mut().update_shipping(AddressPatch { country: Some("India".into()), ..AddressPatch::default() }).unwrap();
        page.select_country(&store, 1).await.unwrap();
        assert_eq!(page.checkout().shipping_form().country, "India");
        assert_eq!(page.checkout().shipping_form().country_id, Some(1));
        assert_eq!(page.locations().states.len(), 1);
    }

    #[test]
    fn test_coupon_in_flight_is_visible() {
        let mut page = page();
        let check = page.begin_coupon("SAVE5").unwrap().expect("request to send");
        assert!(page.view().applying_coupon);
        assert!(page.begin_coupon("OTHER").unwrap().is_none());

        let applied = page
            .finish_coupon(check, Ok(CouponResponse { valid: true, discount: Decimal::new(5, 0), message: None }))
            .unwrap();
        assert!(applied);
        let view = page.view();
        assert!(!view.applying_coupon);
        assert_eq!(view.coupon.map(|c| c.code), Some("SAVE5".to_string()));
    }

    #[tokio::test]
    async fn test_cod_builds_hidden_form() {
        let mut page = page();
        ready_to_pay(&mut page, PaymentMethod::Cod);
        let outcome = page.place_order(&FakeGateway(Err("unused".into()))).await.unwrap();
        let PlacementOutcome::SubmitForm { form } = outcome else { panic!("expected form post") };
        assert_eq!(form.action, "https://shop.test/store/scent-lab/order/place");
        assert_eq!(form.method, "POST");
        assert_eq!(form.fields[0], ("_token".to_string(), "csrf-123".to_string()));
        assert_eq!(page.checkout().placement(), PlacementState::Placed);
    }

    #[tokio::test]
    async fn test_gateway_success_redirects_to_confirmation() {
        let mut page = page();
        ready_to_pay(&mut page, PaymentMethod::Cashfree);
        let gateway = FakeGateway(Ok(OrderConfirmation { order_number: "ORD-77".into(), redirect_url: None }));
        let outcome = page.place_order(&gateway).await.unwrap();
        assert_eq!(outcome, PlacementOutcome::Redirect { url: "https://shop.test/store/scent-lab/order-confirmation/ORD-77".into() });
    }

    #[tokio::test]
    async fn test_gateway_failure_sets_general_error() {
        let mut page = page();
        ready_to_pay(&mut page, PaymentMethod::Cashfree);
        let err = page.place_order(&FakeGateway(Err("Card declined".into()))).await.unwrap_err();
        assert!(matches!(err, CheckoutPageError::Payment(ref m) if m == "Card declined"));
        let view = page.view();
        assert_eq!(view.errors.get("general").map(String::as_str), Some("Card declined"));
        assert_eq!(view.placement, PlacementState::Idle);
    }

    #[test]
    fn test_render_uses_theme_labels() {
        let page = page();
        let view = page.view();
        assert_eq!(view.step_label, "Shipping");
        assert_eq!(view.item_count, 1);
        assert_eq!(view.shipping_methods[0].charged, Decimal::new(10, 0));
        assert_eq!(view.theme.display_name, "Perfume & Fragrances");
    }
}
