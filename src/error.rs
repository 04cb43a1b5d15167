//! Error taxonomy for the PRMS client.
//!
//! Backend-reported failures, transport failures and validation failures are
//! kept apart so that each page can decide how to surface them.

use thiserror::Error;
use validator::ValidationErrors;

/// Message shown for any failure that never reached the backend's JSON layer.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please check your connection.";

#[derive(Error, Debug)]
pub enum PrmsError {
    /// `success: false` (or `status: "error"`) inside a well-formed response.
    #[error("{0}")]
    Backend(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrmsError {
    /// True when the failure happened below the JSON envelope.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PrmsError::Transport(_) | PrmsError::Status { .. } | PrmsError::Decode(_)
        )
    }

    /// Text a page shows for this failure.
    ///
    /// Backend messages are passed through exactly; transport-level failures
    /// collapse to one generic message.
    pub fn user_message(&self) -> String {
        match self {
            PrmsError::Backend(message) => message.clone(),
            PrmsError::Validation(errors) => errors.to_string(),
            PrmsError::Config(e) => e.to_string(),
            PrmsError::Io(e) => e.to_string(),
            _ => SERVER_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for PrmsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PrmsError::Decode(e.to_string())
        } else {
            PrmsError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for PrmsError {
    fn from(e: serde_json::Error) -> Self {
        PrmsError::Decode(e.to_string())
    }
}

pub type Result<T, E = PrmsError> = std::result::Result<T, E>;
