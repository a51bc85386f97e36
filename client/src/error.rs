//! Error types for the catalog API client

use thiserror::Error;

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the catalog API.
///
/// `Clone + PartialEq` so results can travel inside reducer actions and be
/// asserted on in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Resource does not exist (404)
    #[error("Not found")]
    NotFound,

    /// Missing or rejected session (401/403)
    #[error("Unauthorized")]
    Unauthorized,

    /// Request conflicts with current server state (409)
    #[error("Conflict")]
    Conflict,

    /// Request rejected as invalid (400/422, or caught before sending)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Transport failure or server error (5xx)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response body could not be decoded
    #[error("Response decode failed: {0}")]
    Decode(String),

    /// Any other status
    #[error("Unexpected response (status {status}): {message}")]
    Unexpected {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ApiError {
    /// Map a non-success HTTP status and its body to an error.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized,
            409 => Self::Conflict,
            400 | 422 => Self::Validation(extract_message(body)),
            500..=599 => Self::ServiceUnavailable(extract_message(body)),
            _ => Self::Unexpected {
                status,
                message: extract_message(body),
            },
        }
    }

    /// Whether the error means the session is missing or rejected.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": ".."}` or `{"error": ".."}`, falling back to the raw
/// body text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from_status(404, ""), ApiError::NotFound);
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(403, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(409, ""), ApiError::Conflict);
        assert_eq!(
            ApiError::from_status(503, "down"),
            ApiError::ServiceUnavailable("down".to_string())
        );
        assert_eq!(
            ApiError::from_status(418, "teapot"),
            ApiError::Unexpected {
                status: 418,
                message: "teapot".to_string()
            }
        );
    }

    #[test]
    fn test_validation_message_from_json_body() {
        assert_eq!(
            ApiError::from_status(422, r#"{"message":"rating must be 1-5"}"#),
            ApiError::Validation("rating must be 1-5".to_string())
        );
        assert_eq!(
            ApiError::from_status(400, r#"{"error":"bad comment"}"#),
            ApiError::Validation("bad comment".to_string())
        );
        assert_eq!(
            ApiError::from_status(400, "plain text "),
            ApiError::Validation("plain text".to_string())
        );
    }
}
