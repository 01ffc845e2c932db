//! Gateway Error Types
//!
//! Errors surfaced by the generation endpoint and its collaborators.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for the image generation provider
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Provider API token is not configured
    #[error("Missing provider API token")]
    MissingToken,

    /// Transport-level failure talking to the provider
    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Prediction finished in a failed or canceled state
    #[error("Prediction {0}: {1}")]
    Prediction(String, String),

    /// Prediction still running when the generation timeout expired
    #[error("Prediction {0} did not finish within {1}s")]
    Timeout(String, u64),
}

/// Error types for the gateway HTTP layer
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Unknown elemental type
    #[error("Invalid type. Valid types: {0}")]
    UnknownType(String),

    /// Image missing or not a data URL
    #[error("Image is required. Submit base64 data only.")]
    MissingImage,

    /// Image payload over the size limit
    #[error("Image too large. Please use a photo under {0}MB.")]
    ImageTooLarge(usize),

    /// Request body could not be parsed
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Provider returned no image
    #[error("AI generation failed. Please try again.")]
    EmptyOutput,

    /// Provider call failed
    #[error("Failed to generate image. Please try again.")]
    Generation(#[from] GeneratorError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UnknownType(_)
            | GatewayError::MissingImage
            | GatewayError::ImageTooLarge(_)
            | GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::EmptyOutput | GatewayError::Generation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = match &self {
            GatewayError::Generation(source) => json!({
                "error": self.to_string(),
                "details": source.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}
