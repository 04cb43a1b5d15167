//! Page notices (toasts and banners).

use std::fmt;

use serde::Serialize;

use crate::error::PrmsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Level::Success => "OK",
            Level::Info => "INFO",
            Level::Warning => "WARN",
            Level::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// Backend failures keep their own text; anything below the envelope
    /// gets `fallback`.
    pub fn from_error(err: &PrmsError, fallback: &str) -> Self {
        match err {
            PrmsError::Backend(message) => Self::error(message.clone()),
            PrmsError::Validation(_) => Self::new(Level::Warning, err.user_message()),
            _ => Self::error(fallback),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.tag(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_text_wins_over_fallback() {
        let notice = Notice::from_error(&PrmsError::Backend("Backup file not found".into()), "Failed");
        assert_eq!(notice, Notice::error("Backup file not found"));

        let notice = Notice::from_error(&PrmsError::Transport("refused".into()), "Failed to create backup");
        assert_eq!(notice.to_string(), "[ERROR] Failed to create backup");
    }
}
