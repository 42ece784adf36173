use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// The error taxonomy shared by every core operation. Boundary adapters
/// (the Axum handlers) translate this into an HTTP response; nothing
/// upstream of the core ever needs to know the wire format.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("storage unavailable")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("upstream service is temporarily unavailable")]
    TransientUpstream,

    /// Critical: a ledger or settlement invariant was violated mid-transaction.
    /// Always rolled back, always logged at `error`, never detailed to the caller.
    #[error("an internal invariant was violated")]
    Invariant(String),
}

impl CoreError {
    fn code(&self) -> &'static str {
        match self {
            CoreError::Unauthenticated => "UNAUTHENTICATED",
            CoreError::Forbidden => "FORBIDDEN",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Validation(_) => "VALIDATION",
            CoreError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            CoreError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            CoreError::TransientUpstream => "TRANSIENT_UPSTREAM",
            CoreError::Invariant(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            CoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::TransientUpstream => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Invariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. Invariant details never leave the
    /// server; auth failures never explain why.
    fn public_message(&self) -> String {
        match self {
            CoreError::Unauthenticated | CoreError::Forbidden => "access denied".to_string(),
            CoreError::Invariant(_) => "please try again".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        match &self {
            CoreError::Invariant(detail) => {
                tracing::error!(detail = %detail, code = self.code(), "invariant violated");
            }
            CoreError::StorageUnavailable(err) => {
                tracing::error!(error = %err, "storage unavailable");
            }
            CoreError::Unauthenticated | CoreError::Forbidden | CoreError::NotFound(_) => {
                tracing::info!(code = self.code(), "request rejected");
            }
            _ => {
                tracing::warn!(code = self.code(), "request rejected: {}", self);
            }
        }

        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        }));
        (status, body).into_response()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
