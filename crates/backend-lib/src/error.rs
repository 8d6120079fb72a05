// ============================
// crates/backend-lib/src/error.rs
// ============================
//! Central error type + Axum integration.
//!
//! Every caller-visible failure in the API falls into one of a small set of
//! categories. The JSON shape is always the flat
//! `{"success": false, "error": "<message>"}` the web client expects;
//! clients treat `success: false` as authoritative over the HTTP status.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error taxonomy.
#[derive(Error, Debug)]
pub enum AppError {
    /// Entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Caller lacks rights over the entity.
    #[error("{0}")]
    Forbidden(String),

    /// State or invariant violation: duplicate request, wrong lifecycle
    /// state, capacity exceeded.
    #[error("{0}")]
    Conflict(String),

    /// Malformed input.
    #[error("{0}")]
    Invalid(String),

    /// Underlying store unreachable.
    #[error("{0}")]
    Unavailable(String),

    /// Missing or invalid bearer credential.
    #[error("{0}")]
    Auth(String),

    #[error("Too many requests from this IP, please try again later.")]
    RateLimited,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a list-style read may degrade this error to an empty result
    /// instead of propagating it. Only store-side absence/outage qualifies;
    /// anything else stays a hard failure so unexpected error kinds are not
    /// masked.
    pub fn swallow_to_empty(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::Unavailable(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<crate::validation::ValidationError> for AppError {
    fn from(err: crate::validation::ValidationError) -> Self {
        AppError::Invalid(err.to_string())
    }
}
