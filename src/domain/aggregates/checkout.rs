//! Checkout Aggregate
//!
//! One wizard shared by every theme: `Shipping -> Review -> Payment`, then a
//! two-phase placement. `begin_placement` hands out the order payload and
//! locks the wizard while the payment call is in flight;
//! `complete_placement` either finishes the checkout or unlocks it with a
//! `general` error so the shopper can retry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::aggregates::cart::{CartItem, CartSummary, ShippingMethod};
use crate::domain::aggregates::order::{Address, Customer, OrderPayload, PaymentMethod, StoreContext};
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::{CouponCode, EmailAddress, WhatsAppNumber};
use crate::domain::{collect_field_errors, FieldErrors};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Review,
    Payment,
}

impl CheckoutStep {
    pub fn next(self) -> Option<Self> {
        match self { Self::Shipping => Some(Self::Review), Self::Review => Some(Self::Payment), Self::Payment => None }
    }
    pub fn previous(self) -> Option<Self> {
        match self { Self::Shipping => None, Self::Review => Some(Self::Shipping), Self::Payment => Some(Self::Review) }
    }
    pub fn index(self) -> usize { self as usize }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementState {
    #[default]
    Idle,
    Processing,
    Placed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AddressForm {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom = "email_shape")]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "ZIP code is required"))]
    pub zip: String,
    pub country: String,
    pub country_id: Option<u64>,
    pub state_id: Option<u64>,
    pub city_id: Option<u64>,
}

fn email_shape(value: &str) -> Result<(), ValidationError> {
    EmailAddress::parse(value).map(|_| ()).map_err(|e| {
        let mut error = ValidationError::new("email");
        error.message = Some(e.to_string().into());
        error
    })
}

/// Partial update of an address form; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AddressPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

impl AddressPatch {
    /// Applies the patch and returns the names of the fields it touched.
    fn apply(self, form: &mut AddressForm) -> Vec<&'static str> {
        let mut touched = Vec::new();
        let slots: [(&'static str, Option<String>, &mut String); 9] = [
            ("first_name", self.first_name, &mut form.first_name),
            ("last_name", self.last_name, &mut form.last_name),
            ("email", self.email, &mut form.email),
            ("phone", self.phone, &mut form.phone),
            ("street", self.street, &mut form.street),
            ("city", self.city, &mut form.city),
            ("state", self.state, &mut form.state),
            ("zip", self.zip, &mut form.zip),
            ("country", self.country, &mut form.country),
        ];
        for (name, value, slot) in slots {
            if let Some(value) = value {
                *slot = value;
                touched.push(name);
            }
        }
        touched
    }
}

impl AddressForm {
    /// Copy with every text field trimmed, so whitespace-only input counts as empty.
    fn trimmed(&self) -> AddressForm {
        let t = |v: &str| v.trim().to_string();
        AddressForm {
            first_name: t(&self.first_name),
            last_name: t(&self.last_name),
            email: t(&self.email),
            phone: t(&self.phone),
            street: t(&self.street),
            city: t(&self.city),
            state: t(&self.state),
            zip: t(&self.zip),
            country: t(&self.country),
            ..self.clone()
        }
    }

    fn customer(&self) -> Customer {
        Customer { first_name: self.first_name.clone(), last_name: self.last_name.clone(), email: self.email.clone(), phone: self.phone.clone() }
    }
    fn address(&self) -> Address {
        Address { street: self.street.clone(), city: self.city.clone(), state: self.state.clone(), zip: self.zip.clone(), country: self.country.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("please correct the highlighted fields")]
    Validation(FieldErrors),
    #[error("unknown shipping method {0}")]
    UnknownShippingMethod(u64),
    #[error("payment method {0} is not available for this store")]
    PaymentMethodUnavailable(String),
    #[error("already on the last step")]
    NoNextStep,
    #[error("orders can only be placed from the payment step")]
    NotOnPaymentStep,
    #[error("order is already being processed")]
    AlreadyProcessing,
    #[error("order has already been placed")]
    AlreadyPlaced,
    #[error("no order placement in progress")]
    NotProcessing,
}

/// Checkout wizard state for one page instance.
#[derive(Clone, Debug)]
pub struct Checkout {
    store: StoreContext,
    items: Vec<CartItem>,
    shipping_methods: Vec<ShippingMethod>,
    payment_methods: Vec<PaymentMethod>,
    tax: Decimal,
    step: CheckoutStep,
    shipping: AddressForm,
    billing: AddressForm,
    billing_same_as_shipping: bool,
    shipping_method_id: Option<u64>,
    payment_method: Option<PaymentMethod>,
    whatsapp_number: String,
    coupon: Option<AppliedCoupon>,
    notes: String,
    errors: FieldErrors,
    placement: PlacementState,
    events: Vec<DomainEvent>,
}

impl Checkout {
    pub fn new(
        store: StoreContext,
        items: Vec<CartItem>,
        shipping_methods: Vec<ShippingMethod>,
        payment_methods: Vec<PaymentMethod>,
        tax: Decimal,
    ) -> Result<Self, CheckoutError> {
        if items.is_empty() { return Err(CheckoutError::EmptyCart); }
        let shipping_method_id = shipping_methods.first().map(|m| m.id);
        Ok(Self {
            store, items, shipping_methods, payment_methods, tax,
            step: CheckoutStep::Shipping, shipping: AddressForm::default(), billing: AddressForm::default(),
            billing_same_as_shipping: true, shipping_method_id, payment_method: None, whatsapp_number: String::new(),
            coupon: None, notes: String::new(), errors: FieldErrors::new(), placement: PlacementState::Idle, events: vec![],
        })
    }

    pub fn store(&self) -> &StoreContext { &self.store }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn shipping_methods(&self) -> &[ShippingMethod] { &self.shipping_methods }
    pub fn payment_methods(&self) -> &[PaymentMethod] { &self.payment_methods }
    pub fn step(&self) -> CheckoutStep { self.step }
    pub fn shipping_form(&self) -> &AddressForm { &self.shipping }
    pub fn billing_form(&self) -> &AddressForm { &self.billing }
    pub fn billing_same_as_shipping(&self) -> bool { self.billing_same_as_shipping }
    pub fn shipping_method_id(&self) -> Option<u64> { self.shipping_method_id }
    pub fn payment_method(&self) -> Option<&PaymentMethod> { self.payment_method.as_ref() }
    pub fn whatsapp_number(&self) -> &str { &self.whatsapp_number }
    pub fn coupon(&self) -> Option<&AppliedCoupon> { self.coupon.as_ref() }
    pub fn notes(&self) -> &str { &self.notes }
    pub fn errors(&self) -> &FieldErrors { &self.errors }
    pub fn placement(&self) -> PlacementState { self.placement }

    pub fn selected_shipping_method(&self) -> Option<&ShippingMethod> {
        self.shipping_method_id.and_then(|id| self.shipping_methods.iter().find(|m| m.id == id))
    }

    pub fn summary(&self) -> CartSummary {
        let discount = self.coupon.as_ref().map_or(Decimal::ZERO, |c| c.discount);
        CartSummary::compute(&self.items, self.selected_shipping_method(), discount, self.tax)
    }

    pub fn ensure_editable(&self) -> Result<(), CheckoutError> {
        match self.placement {
            PlacementState::Idle => Ok(()),
            PlacementState::Processing => Err(CheckoutError::AlreadyProcessing),
            PlacementState::Placed => Err(CheckoutError::AlreadyPlaced),
        }
    }

    pub fn update_shipping(&mut self, patch: AddressPatch) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        for field in patch.apply(&mut self.shipping) {
            self.errors.remove(field);
        }
        Ok(())
    }

    pub fn update_billing(&mut self, patch: AddressPatch) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        for field in patch.apply(&mut self.billing) {
            self.errors.remove(&format!("billing_{field}"));
        }
        Ok(())
    }

    pub fn set_billing_same_as_shipping(&mut self, same: bool) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        self.billing_same_as_shipping = same;
        if same {
            self.errors.retain(|k, _| !k.starts_with("billing_"));
        }
        Ok(())
    }

    /// Country change resets the dependent state and city selections.
    pub fn set_country(&mut self, id: u64, name: &str) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        self.shipping.country_id = Some(id);
        self.shipping.country = name.to_string();
        self.shipping.state_id = None;
        self.shipping.state.clear();
        self.shipping.city_id = None;
        self.shipping.city.clear();
        Ok(())
    }

    pub fn set_state(&mut self, id: u64, name: &str) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        self.shipping.state_id = Some(id);
        self.shipping.state = name.to_string();
        self.shipping.city_id = None;
        self.shipping.city.clear();
        self.errors.remove("state");
        Ok(())
    }

    pub fn set_city(&mut self, id: u64, name: &str) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        self.shipping.city_id = Some(id);
        self.shipping.city = name.to_string();
        self.errors.remove("city");
        Ok(())
    }

    pub fn select_shipping_method(&mut self, id: u64) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        if !self.shipping_methods.iter().any(|m| m.id == id) {
            return Err(CheckoutError::UnknownShippingMethod(id));
        }
        self.shipping_method_id = Some(id);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        self.notes = notes.into();
        Ok(())
    }

    fn validate_addresses(&self) -> FieldErrors {
        let mut errors = match self.shipping.trimmed().validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect_field_errors(&e, ""),
        };
        if !self.billing_same_as_shipping {
            if let Err(e) = self.billing.trimmed().validate() {
                errors.extend(collect_field_errors(&e, "billing_"));
            }
        }
        errors
    }

    /// Moves one step forward. Leaving `Shipping` requires a valid address.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_editable()?;
        let next = self.step.next().ok_or(CheckoutError::NoNextStep)?;
        if self.step == CheckoutStep::Shipping {
            let errors = self.validate_addresses();
            if !errors.is_empty() {
                self.errors = errors.clone();
                return Err(CheckoutError::Validation(errors));
            }
            self.errors.clear();
        }
        self.move_to(next);
        Ok(next)
    }

    /// Moves one step back; a no-op on the first step.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_editable()?;
        if let Some(previous) = self.step.previous() {
            self.move_to(previous);
        }
        Ok(self.step)
    }

    fn move_to(&mut self, to: CheckoutStep) {
        let from = std::mem::replace(&mut self.step, to);
        self.raise_event(DomainEvent::Checkout(CheckoutEvent::StepChanged { from, to }));
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        if !self.payment_methods.contains(&method) {
            return Err(CheckoutError::PaymentMethodUnavailable(method.to_string()));
        }
        if method != PaymentMethod::WhatsApp {
            self.errors.remove("whatsapp_number");
        }
        self.errors.remove("payment_method");
        self.errors.remove("general");
        self.payment_method = Some(method);
        Ok(())
    }

    /// Stores the number and re-checks it as the shopper types. An empty
    /// field is only reported on submit.
    pub fn set_whatsapp_number(&mut self, value: impl Into<String>) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        self.whatsapp_number = value.into();
        match WhatsAppNumber::parse(&self.whatsapp_number) {
            Err(e) if !self.whatsapp_number.trim().is_empty() => {
                self.errors.insert("whatsapp_number".into(), e.to_string());
            }
            _ => {
                self.errors.remove("whatsapp_number");
            }
        }
        Ok(())
    }

    pub fn apply_coupon(&mut self, code: CouponCode, discount: Decimal) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        let code = code.to_string();
        self.coupon = Some(AppliedCoupon { code: code.clone(), discount });
        self.raise_event(DomainEvent::Checkout(CheckoutEvent::CouponApplied { code, discount }));
        Ok(())
    }

    pub fn remove_coupon(&mut self) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        if let Some(coupon) = self.coupon.take() {
            self.raise_event(DomainEvent::Checkout(CheckoutEvent::CouponRemoved { code: coupon.code }));
        }
        Ok(())
    }

    /// Validates everything needed to pay and locks the wizard.
    pub fn begin_placement(&mut self) -> Result<OrderPayload, CheckoutError> {
        self.ensure_editable()?;
        if self.step != CheckoutStep::Payment { return Err(CheckoutError::NotOnPaymentStep); }

        let mut errors = self.validate_addresses();
        let whatsapp = match &self.payment_method {
            None => {
                errors.insert("payment_method".into(), "Please select a payment method".into());
                None
            }
            Some(PaymentMethod::WhatsApp) => match WhatsAppNumber::parse(&self.whatsapp_number) {
                Ok(number) => Some(number.to_string()),
                Err(e) => {
                    errors.insert("whatsapp_number".into(), e.to_string());
                    None
                }
            },
            Some(_) => None,
        };
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(CheckoutError::Validation(errors));
        }
        let payment_method = self.payment_method.clone().ok_or(CheckoutError::Validation(FieldErrors::new()))?;

        let billing = if self.billing_same_as_shipping { &self.shipping } else { &self.billing };
        let payload = OrderPayload {
            store_id: self.store.id,
            customer: self.shipping.customer(),
            shipping_address: self.shipping.address(),
            billing_address: billing.address(),
            payment_method,
            shipping_method_id: self.shipping_method_id,
            notes: self.notes.clone(),
            coupon_code: self.coupon.as_ref().map(|c| c.code.clone()),
            whatsapp_number: whatsapp,
            summary: self.summary(),
        };
        self.errors.clear();
        self.placement = PlacementState::Processing;
        Ok(payload)
    }

    /// Finishes a placement started by [`Checkout::begin_placement`].
    pub fn complete_placement(&mut self, outcome: Result<(), String>) -> Result<(), CheckoutError> {
        if self.placement != PlacementState::Processing { return Err(CheckoutError::NotProcessing); }
        match outcome {
            Ok(()) => {
                self.placement = PlacementState::Placed;
                let payment_method = self.payment_method.as_ref().map(|m| m.to_string()).unwrap_or_default();
                let total = self.summary().total;
                self.raise_event(DomainEvent::Checkout(CheckoutEvent::OrderPlaced { store_id: self.store.id, payment_method, total }));
            }
            Err(reason) => {
                self.placement = PlacementState::Idle;
                self.errors.insert("general".into(), reason.clone());
                self.raise_event(DomainEvent::Checkout(CheckoutEvent::PlacementFailed { store_id: self.store.id, reason }));
            }
        }
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}
