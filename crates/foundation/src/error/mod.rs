//! Error types for Claude Bridge

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Claude Bridge error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sentinel for the permission gate - the only failure a tool is
    /// expected to surface as a typed error rather than textual content.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External client (Claude Code CLI) failure
    #[error("Client error: {0}")]
    Client(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error should be shown to the user as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::PermissionDenied(_) | Error::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors() {
        assert!(Error::PermissionDenied("delegation".to_string()).is_user_facing());
        assert!(Error::InvalidInput("empty query".to_string()).is_user_facing());
        assert!(!Error::Client("spawn failed".to_string()).is_user_facing());
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::Client("claude exited with 1".to_string());
        assert_eq!(err.to_string(), "Client error: claude exited with 1");
    }
}
