//! Error types for HackMate

use thiserror::Error;

/// Result type alias using HackMate's Error
pub type Result<T> = std::result::Result<T, Error>;

/// HackMate error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Project '{0}' not found in cache. Run `hackmate create` to generate it.")]
    ProjectNotFound(String),

    // Upstream errors (E100-E199)
    #[error("Transport error: {cause}")]
    Transport { cause: String },

    #[error("API request failed: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    // Cache errors (E400-E499)
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Serialization errors (E900-E999)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a transport error from any displayable cause
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport {
            cause: cause.to_string(),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) => "E002",
            Self::Transport { .. } => "E100",
            Self::Upstream { .. } => "E101",
            Self::Cache(_) => "E400",
            Self::Database(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Serialization(_) => "E900",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ProjectNotFound(_) => {
                Some("hackmate create --title <TITLE> --brief <BRIEF>".to_string())
            }
            Self::Transport { .. } => Some("Check internet connection".to_string()),
            Self::Upstream { status: 400 | 401 | 403, .. } => {
                Some("Set HACKMATE_API_KEY or GEMINI_API_KEY to a valid key".to_string())
            }
            Self::ConfigError(_) => Some("hackmate config list".to_string()),
            Self::Cache(_) | Self::Database(_) => Some("hackmate doctor".to_string()),
            _ => None,
        }
    }

    /// Whether this error belongs to a single agent call rather than the request
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Upstream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::ProjectNotFound("x".into()).code(), "E002");
        assert_eq!(Error::transport("timed out").code(), "E100");
        assert_eq!(
            Error::Upstream {
                status: 500,
                body: String::new()
            }
            .code(),
            "E101"
        );
        assert_eq!(Error::Cache("down".into()).code(), "E400");
        assert_eq!(Error::InvalidInput("bad".into()).code(), "E800");
        assert_eq!(Error::Other("?".into()).code(), "E9999");
    }

    #[test]
    fn test_upstream_display() {
        let err = Error::Upstream {
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "API request failed: HTTP 503: overloaded");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_transport_display() {
        let err = Error::transport("connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
        assert!(err.is_upstream());
        assert!(!Error::Cache("x".into()).is_upstream());
    }

    #[test]
    fn test_suggestions() {
        let unauthorized = Error::Upstream {
            status: 401,
            body: String::new(),
        };
        assert!(unauthorized.suggestion().unwrap().contains("GEMINI_API_KEY"));

        let server = Error::Upstream {
            status: 500,
            body: String::new(),
        };
        assert!(server.suggestion().is_none());

        assert_eq!(
            Error::Cache("x".into()).suggestion().as_deref(),
            Some("hackmate doctor")
        );
    }
}
