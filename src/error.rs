// region:    --- Imports
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::bidding::validator::RejectReason;
// endregion: --- Imports

// region:    --- AppError

/// Errors a bid submission or auction operation can surface to a client.
///
/// The three variants map onto the taxonomy the service distinguishes:
/// a typed rejection (the client's bid was bad or stale), contention on
/// the per-product critical section (retryable), and a record store
/// failure (may have partially applied, never retried silently).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("bid rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error("auction is contended, retry later")]
    Contended,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Rejected(reason) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": reason.to_string(), "code": reason.code() }),
            ),
            AppError::Contended => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string(), "code": "contended" }),
            ),
            AppError::Store(StoreError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("product {id} not found") }),
            ),
            AppError::Store(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "record store unavailable, try again" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// endregion: --- AppError

// region:    --- StoreError

/// Failures of the Product record store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("product {0} not found")]
    NotFound(String),

    #[error("record store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("record store returned unexpected status {0}")]
    Status(StatusCode),

    #[error("record store returned an undecodable record: {0}")]
    Decode(#[from] serde_json::Error),
}

// endregion: --- StoreError
