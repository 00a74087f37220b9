//! Error responses of the front door.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontDoorError {
    #[error("Content-Length header is required")]
    MissingContentLength,

    #[error("Content-Length header is not a valid length")]
    InvalidContentLength,

    #[error("Payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Page {0} is unavailable")]
    PageUnavailable(String),
}

impl FrontDoorError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingContentLength => StatusCode::LENGTH_REQUIRED,
            Self::InvalidContentLength | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::PageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FrontDoorError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (self.status(), self.to_string()).into_response()
    }
}
