use thiserror::Error;

use super::session::SessionError;

/// Errors that can occur when talking to the HealthTrack API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Server rejected the session; it has been cleared
    #[error("Session expired or invalid, please log in again")]
    Unauthorized,

    /// Response body did not match the expected shape
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Resource path was empty
    #[error("Invalid resource path: {0:?}")]
    InvalidPath(String),

    /// Session storage failed
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
