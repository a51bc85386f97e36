//! Client configuration.

use reqwest::Url;
use thiserror::Error;

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/";

/// The configured base URL is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid API base URL {url:?}: {reason}")]
pub struct BaseUrlError {
    /// The rejected value
    pub url: String,
    /// Why it was rejected
    pub reason: String,
}

/// Connection settings for [`crate::HttpEventApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Url,
}

impl ApiConfig {
    /// Parse a base URL.
    ///
    /// A trailing slash is added when missing so relative paths resolve under
    /// it rather than replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`BaseUrlError`] if the URL does not parse or cannot be a base.
    pub fn new(base_url: &str) -> Result<Self, BaseUrlError> {
        let trimmed = base_url.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };

        let url = Url::parse(&normalized).map_err(|e| BaseUrlError {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(BaseUrlError {
                url: base_url.to_string(),
                reason: "cannot be a base URL".to_string(),
            });
        }

        Ok(Self { base_url: url })
    }

    /// The normalized base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_added() {
        let config = ApiConfig::new("https://catalog.example/api").unwrap();
        assert_eq!(config.base_url().as_str(), "https://catalog.example/api/");
        assert_eq!(
            config.base_url().join("events/42").unwrap().as_str(),
            "https://catalog.example/api/events/42"
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ApiConfig::new("not a url").is_err());
        assert!(ApiConfig::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_default_url_parses() {
        assert_eq!(
            ApiConfig::new(DEFAULT_API_URL).unwrap().base_url().as_str(),
            DEFAULT_API_URL
        );
    }
}
