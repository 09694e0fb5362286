use axum::{
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

    #[error("Validation error: {0}")]
    Validation(String),

    /// No gateway credential resolvable for the tenant/branch.
    /// Never retried automatically; the tenant admin must connect credentials.
    #[error("Payment gateway not configured")]
    GatewayNotConfigured,

    /// Non-2xx (or unreachable) response from the payment gateway.
    /// Financial operation: never retried, detail logged but not surfaced.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Checkout signature did not match. Security-relevant: logged,
    /// surfaced without cryptographic detail, no entitlement written.
    #[error("Payment verification failed")]
    VerificationFailed,

    /// Auth-critical store lookup exceeded its deadline. Distinct from a
    /// denial: the caller should retry, not give up.
    #[error("Authorization check timed out")]
    Timeout,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

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

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for AppError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<StatusCode> for AppError {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized,
            StatusCode::FORBIDDEN => AppError::Forbidden("Access denied".into()),
            StatusCode::NOT_FOUND => AppError::NotFound("Resource not found".into()),
            _ => AppError::Internal(format!("Status: {}", code)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "Not found", Some(m.clone())),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "Bad request", Some(m.clone())),
            AppError::Validation(m) => {
                (StatusCode::BAD_REQUEST, "Validation error", Some(m.clone()))
            }
            AppError::GatewayNotConfigured => {
                (StatusCode::BAD_REQUEST, msg::GATEWAY_NOT_CONFIGURED, None)
            }
            AppError::Gateway(e) => {
                tracing::error!("Gateway error: {}", e);
                (StatusCode::BAD_GATEWAY, msg::ORDER_CREATE_FAILED, None)
            }
            AppError::VerificationFailed => {
                tracing::warn!("Payment verification failed");
                (StatusCode::BAD_REQUEST, msg::VERIFICATION_FAILED, None)
            }
            AppError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Request timed out, please retry",
                None,
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "Forbidden", Some(m.clone())),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "Conflict", Some(m.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(m) => {
                tracing::error!("Internal error: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
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

/// Convert `Ok(None)` into a NotFound error with a fixed message.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Result<Option<T>> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self?.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

/// User-safe message constants. Everything here may end up in a response
/// body, so no secrets, stack traces or gateway internals.
pub mod msg {
    pub const TENANT_NOT_FOUND: &str = "Tenant not found";
    pub const BRANCH_NOT_FOUND: &str = "Branch not found";
    pub const MEMBER_NOT_FOUND: &str = "Member not found";
    pub const STAFF_NOT_FOUND: &str = "Staff member not found";
    pub const PACKAGE_NOT_FOUND: &str = "Package not found";
    pub const TRAINER_NOT_FOUND: &str = "Trainer not found";
    pub const PAYMENT_NOT_FOUND: &str = "Payment not found";

    pub const GATEWAY_NOT_CONFIGURED: &str = "Payment gateway not configured for this gym";
    pub const ORDER_CREATE_FAILED: &str = "Failed to create payment order";
    pub const VERIFICATION_FAILED: &str = "Payment verification failed";
    pub const MEMBER_EXISTS: &str = "Member with this phone number already exists";

    pub const INVALID_KEY_ID: &str =
        "Invalid Razorpay key id (expected rzp_test_/rzp_live_ prefix)";
    pub const CREDENTIAL_TEST_FAILED: &str =
        "Could not verify credentials with the payment gateway";

    pub const PLAN_EXPIRED: &str = "Your plan has expired. Please renew to continue";
    pub const MODULE_NOT_AVAILABLE: &str = "This module is not available on your plan";

    pub const BRANCH_LIMIT_REACHED: &str = "Branch limit for this plan has been reached";
    pub const STAFF_LIMIT_REACHED: &str = "Staff limit for this plan has been reached";
    pub const MEMBER_LIMIT_REACHED: &str = "Member limit for this plan has been reached";

    pub const NAME_EMPTY: &str = "Name cannot be empty";
}
