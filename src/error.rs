//! Unified error types for reimagine.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Message shown when a service failed without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "The service returned an error with no message.";

/// The pipeline stage a service error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Turning the uploaded image and instruction into a descriptive prompt.
    Describe,
    /// Turning the descriptive prompt into a new image.
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Describe => f.write_str("prompt description"),
            Self::Generate => f.write_str("image generation"),
        }
    }
}

/// Errors raised by a remote service adapter.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered successfully but the body was unusable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The call did not complete within the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// A replayed interaction was missing or recorded as an error.
    #[error("Replay error: {0}")]
    Replay(String),
}

impl ServiceError {
    /// The message to show the user for this failure.
    ///
    /// Google APIs wrap failures as `{"error": {"message": ...}}`; when that
    /// envelope is present only the inner message is returned. Otherwise the
    /// raw text is used, falling back to [`GENERIC_FAILURE_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => extract_api_message(message)
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            Self::Network(e) => e.to_string(),
            Self::MalformedResponse(m) | Self::Replay(m) if !m.trim().is_empty() => m.clone(),
            Self::MalformedResponse(_) | Self::Replay(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            Self::Timeout(_) => self.to_string(),
        }
    }
}

fn extract_api_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let from_envelope = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty());
    Some(from_envelope.unwrap_or_else(|| body.to_string()))
}

/// Errors that can occur while editing an image.
#[derive(Debug, Error)]
pub enum EditError {
    /// Inputs were missing or empty; no service was called.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The uploaded file could not be read into memory.
    #[error("Failed to read image {}: {source}", .path.display())]
    Read {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A remote service call failed.
    #[error("{stage} failed: {}", .source.user_message())]
    Service {
        /// The stage that failed.
        stage: Stage,
        /// The adapter error.
        source: ServiceError,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),
}

impl EditError {
    /// The message a display should show for a failed run.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Service { source, .. } => source.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_unwraps_google_envelope() {
        let err = ServiceError::Api {
            status: 400,
            message: r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#.into(),
        };
        assert_eq!(err.user_message(), "API key not valid. Please pass a valid API key.");
    }

    #[test]
    fn api_message_passes_plain_text_through() {
        let err = ServiceError::Api { status: 429, message: "quota exceeded".into() };
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[test]
    fn empty_api_body_uses_fallback() {
        let err = ServiceError::Api { status: 500, message: "  ".into() };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn envelope_without_message_keeps_body() {
        let err = ServiceError::Api { status: 500, message: r#"{"error":{}}"#.into() };
        assert_eq!(err.user_message(), r#"{"error":{}}"#);
    }

    #[test]
    fn timeout_message_names_duration() {
        let err = ServiceError::Timeout(Duration::from_secs(30));
        assert_eq!(err.user_message(), "Timed out after 30s");
    }

    #[test]
    fn service_error_display_includes_stage() {
        let err = EditError::Service {
            stage: Stage::Describe,
            source: ServiceError::Api { status: 403, message: "forbidden".into() },
        };
        assert_eq!(err.to_string(), "prompt description failed: forbidden");
        assert_eq!(err.user_message(), "forbidden");
    }
}
