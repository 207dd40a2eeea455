use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Well-known error message constants, shared between handlers and tests.
pub mod msg {
    pub const TENANT_NOT_FOUND: &str = "Tenant not found";
    pub const CUSTOMER_NOT_FOUND: &str = "Customer not found";
    pub const APPOINTMENT_NOT_FOUND: &str = "Appointment not found";
    pub const CHECKOUT_SESSION_NOT_FOUND: &str = "Checkout session not found";
    pub const STRIPE_NOT_CONFIGURED: &str = "Payment provider not configured";
    pub const NOT_SUBSCRIPTION_CHECKOUT: &str = "Checkout session is not a subscription";
    pub const CHECKOUT_NOT_PAID: &str = "Checkout session is not paid";
    pub const CHECKOUT_MISSING_EMAIL: &str = "Checkout session has no customer email";
    pub const CHECKOUT_MISSING_SUBSCRIPTION: &str = "Checkout session has no subscription";
    pub const UNKNOWN_PLAN: &str = "Unknown plan tier";
    pub const INVALID_WAITLIST_STATUS: &str = "Invalid waitlist status filter";
    pub const CUSTOMER_WRONG_TENANT: &str = "Customer belongs to a different tenant";
    pub const PHONE_REQUIRED: &str = "from is required";
}

/// Extension for turning `Ok(None)` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 5xx responses include the underlying message in `details` so the
        // webhook caller sees why its delivery failed (it will resend the
        // same event; the conditional updates make that safe).
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::PaymentRequired(msg) => {
                (StatusCode::PAYMENT_REQUIRED, "Payment required", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error",
                    Some(e.to_string()),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error",
                    Some(e.to_string()),
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                    Some(msg.clone()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
