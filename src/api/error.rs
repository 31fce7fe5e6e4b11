//! HTTP error mapping for the page API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::aggregates::{CheckoutError, ReviewError};
use crate::domain::FieldErrors;
use crate::pages::{CheckoutPageError, ProductPageError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Form input failed validation; carries the per-field messages.
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is valid but not allowed in the page's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A store backend or payment call failed.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn session(id: impl std::fmt::Display) -> Self { Self::NotFound(format!("page session {id}")) }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(errors) => Self::Validation(errors),
            CheckoutError::EmptyCart | CheckoutError::UnknownShippingMethod(_) | CheckoutError::PaymentMethodUnavailable(_) => {
                Self::BadRequest(e.to_string())
            }
            CheckoutError::NoNextStep
            | CheckoutError::NotOnPaymentStep
            | CheckoutError::AlreadyProcessing
            | CheckoutError::AlreadyPlaced
            | CheckoutError::NotProcessing => Self::Conflict(e.to_string()),
        }
    }
}

impl From<CheckoutPageError> for ApiError {
    fn from(e: CheckoutPageError) -> Self {
        match e {
            CheckoutPageError::Checkout(e) => e.into(),
            CheckoutPageError::UnknownLocation { .. } => Self::BadRequest(e.to_string()),
            CheckoutPageError::Payment(message) => Self::Upstream(message),
        }
    }
}

impl From<ProductPageError> for ApiError {
    fn from(e: ProductPageError) -> Self {
        match e {
            ProductPageError::Review(ReviewError::Invalid(errors)) => Self::Validation(errors),
            ProductPageError::IncompleteVariants(_) | ProductPageError::OutOfStock | ProductPageError::Busy => {
                Self::Conflict(e.to_string())
            }
            ProductPageError::Variant(_) | ProductPageError::TabUnavailable(_) | ProductPageError::ImageOutOfRange(_) => {
                Self::BadRequest(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Upstream(_) = self {
            tracing::error!(error = %self, "Request error");
        }
        let status = self.status();
        let body = match self {
            Self::Validation(fields) => json!({ "error": "Validation failed", "fields": fields }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
