//! Error type shared by the corpus loader, the index, and the review
//! pipeline, plus its mapping onto HTTP responses.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::ErrorBody;

pub const NO_DIFF_MESSAGE: &str = "No diff provided";

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("No diff provided")]
    InvalidRequest,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("Review index is not ready")]
    NotReady,

    #[error("Failed to build review index: {0}")]
    IndexBuild(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Upstream model timed out after {0}s")]
    UpstreamTimeout(u64),

    #[error("Failed to read corpus {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReviewError {
    /// Build an `Upstream` error from a capability failure, keeping the
    /// whole context chain in the message.
    pub fn upstream(err: anyhow::Error) -> Self {
        ReviewError::Upstream(format!("{err:#}"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::InvalidRequest | ReviewError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ReviewError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ReviewError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ReviewError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ReviewError::IndexBuild(_) | ReviewError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Review request failed ({status}): {self}");
        } else {
            tracing::warn!("Review request rejected ({status}): {self}");
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub type ReviewResult<T> = Result<T, ReviewError>;
