//! Error types shared by the gateway and the screen controllers.

use thiserror::Error;

/// Failures of a backend gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend answered with a non-2xx status.
    #[error("API Error: {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while turning a camera shot or picked file into a scan result.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ScanError {
    /// Errors raised before the image was in hand.
    pub fn is_capture_stage(&self) -> bool {
        matches!(self, ScanError::Permission(_) | ScanError::Capture(_))
    }
}
