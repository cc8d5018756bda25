use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rusqlite::ErrorCode;

use crate::models::Booking;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    // SQLITE_BUSY / SQLITE_LOCKED
    #[error("transient storage conflict: {0}")]
    TransientConflict(rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage task failed: {0}")]
    StorageTask(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("booking already cancelled")]
    AlreadyCancelled(Box<Booking>),

    #[error("duplicate order id: {0}")]
    DuplicateOrder(String),

    #[error("payment not completed (status: {status})")]
    ProviderNotCompleted { order_id: String, status: String },

    #[error("payment provider error: {0}")]
    PaymentProvider(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::TransientConflict(_))
    }

    pub fn already_booked() -> Self {
        AppError::Conflict("Hotel already booked for selected dates".to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if is_busy(&err) {
            AppError::TransientConflict(err)
        } else {
            AppError::Database(err)
        }
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(_)
            | AppError::TransientConflict(_)
            | AppError::Config(_)
            | AppError::StorageTask(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                let message = match &self {
                    AppError::Internal(msg) => msg.clone(),
                    _ => "internal server error".to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "message": message }),
                )
            }
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": self.to_string() }),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "message": self.to_string() }),
            ),
            AppError::Conflict(_) | AppError::DuplicateOrder(_) => (
                StatusCode::CONFLICT,
                serde_json::json!({ "message": self.to_string() }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "message": self.to_string() }),
            ),
            AppError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                serde_json::json!({ "message": self.to_string() }),
            ),
            // Cancelling twice is not a failure; hand back the booking as it stands.
            AppError::AlreadyCancelled(booking) => (
                StatusCode::OK,
                serde_json::json!({
                    "message": "Booking already cancelled",
                    "booking": booking,
                }),
            ),
            AppError::ProviderNotCompleted { order_id, status } => (
                StatusCode::PAYMENT_REQUIRED,
                serde_json::json!({
                    "message": "Payment not completed",
                    "orderId": order_id,
                    "status": status,
                }),
            ),
            AppError::PaymentProvider(_) => {
                tracing::error!(error = %self, "payment provider call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    serde_json::json!({ "message": "payment provider unavailable" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
