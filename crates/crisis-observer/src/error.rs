//! Observer request failures and their HTTP mapping.
//!
//! Every failure is answered as `{"error": <message>, "status": <code>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Why an observer request could not be answered.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// No tick has been published since the observer started.
    #[error("no tick has been published yet")]
    NothingPublished,

    /// Operator endpoint hit while no episode is attached.
    #[error("no run attached")]
    NoRunAttached,

    /// A request body value was rejected.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A snapshot could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ObserverError {
    /// Status code sent for this failure.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NothingPublished => StatusCode::NOT_FOUND,
            Self::NoRunAttached => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
