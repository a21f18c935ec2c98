// ABOUTME: Error taxonomy for ingestion and dispatch with user-friendly messages
// ABOUTME: Maps transport, HTTP and encoding failures onto a small set of typed variants

use crate::constants::status;
use thiserror::Error;

/// Discriminant of a [`PartlensError`], useful when only the category matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Encoding,
    Timeout,
    Http,
    Transport,
    Configuration,
}

#[derive(Debug, Error)]
pub enum PartlensError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to encode {name}: {message}")]
    Encoding { name: String, message: String },

    #[error("Timeout: the API call took too long to complete")]
    Timeout,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("API call failed: {message}")]
    Transport { message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PartlensError {
    pub fn encoding(name: impl Into<String>, message: impl Into<String>) -> Self {
        PartlensError::Encoding {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        PartlensError::Transport {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PartlensError::Validation(_) => ErrorKind::Validation,
            PartlensError::Encoding { .. } => ErrorKind::Encoding,
            PartlensError::Timeout => ErrorKind::Timeout,
            PartlensError::Http { .. } => ErrorKind::Http,
            PartlensError::Transport { .. } => ErrorKind::Transport,
            PartlensError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Status code carried by dispatch errors: the remote status, 408 or 520.
    pub fn status(&self) -> Option<u16> {
        match self {
            PartlensError::Timeout => Some(status::TIMEOUT),
            PartlensError::Http { status, .. } => Some(*status),
            PartlensError::Transport { .. } => Some(status::TRANSPORT_FAILURE),
            _ => None,
        }
    }

    /// One human-readable line suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self.status() {
            Some(401) => "Invalid API key.".to_string(),
            Some(429) => "Rate limit reached. Try again later.".to_string(),
            Some(status::TIMEOUT) => "The API call timed out.".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn help_text(&self) -> Option<&'static str> {
        match self.status() {
            Some(401) => Some("Get an API key from: https://platform.openai.com/api-keys"),
            Some(429) => Some("Wait a moment before making another request"),
            Some(status::TIMEOUT) => Some("Try again, or use fewer or smaller images"),
            Some(status::TRANSPORT_FAILURE) => {
                Some("Check your internet connection and the configured API URL")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PartlensError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PartlensError::Timeout
        } else {
            PartlensError::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PartlensError {
    fn from(err: serde_json::Error) -> Self {
        PartlensError::transport(format!("Invalid API response format: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PartlensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PartlensError::Validation("Add at least one image.".to_string()).to_string(),
            "Add at least one image."
        );
        assert_eq!(
            PartlensError::encoding("part.png", "bad header").to_string(),
            "Failed to encode part.png: bad header"
        );
        assert_eq!(
            PartlensError::Http {
                status: 429,
                message: "rate limited".to_string()
            }
            .to_string(),
            "rate limited"
        );
        assert_eq!(
            PartlensError::transport("connection refused").to_string(),
            "API call failed: connection refused"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PartlensError::Timeout.status(), Some(408));
        assert_eq!(PartlensError::transport("x").status(), Some(520));
        assert_eq!(
            PartlensError::Http {
                status: 503,
                message: "down".to_string()
            }
            .status(),
            Some(503)
        );
        assert_eq!(PartlensError::Validation("x".to_string()).status(), None);
        assert_eq!(PartlensError::encoding("a", "b").status(), None);
    }

    #[test]
    fn test_kind_discriminant() {
        assert_eq!(PartlensError::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(PartlensError::transport("x").kind(), ErrorKind::Transport);
        assert_eq!(
            PartlensError::Configuration("x".to_string()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_user_message() {
        let unauthorized = PartlensError::Http {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        };
        assert_eq!(unauthorized.user_message(), "Invalid API key.");

        let rate_limited = PartlensError::Http {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert!(rate_limited.user_message().contains("Rate limit"));

        assert_eq!(
            PartlensError::Timeout.user_message(),
            "The API call timed out."
        );

        let other = PartlensError::Http {
            status: 400,
            message: "Unsupported parameter".to_string(),
        };
        assert_eq!(other.user_message(), "Unsupported parameter");
    }

    #[test]
    fn test_help_text() {
        assert!(PartlensError::Timeout.help_text().is_some());
        assert!(
            PartlensError::Http {
                status: 401,
                message: String::new()
            }
            .help_text()
            .unwrap()
            .contains("api-keys")
        );
        assert_eq!(PartlensError::Validation("x".to_string()).help_text(), None);
    }

    #[test]
    fn test_from_serde_error_is_transport() {
        let err: PartlensError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), Some(520));
    }
}
