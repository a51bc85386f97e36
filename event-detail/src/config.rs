//! Configuration for the event-detail binary.
//!
//! Loaded from environment variables (optionally via a `.env` file) with
//! defaults for everything except the demo session.

use heritage_auth::{AuthError, Identity, Role, UserId};
use heritage_client::{ApiConfig, BaseUrlError, DEFAULT_API_URL};
use std::time::Duration;
use thiserror::Error;

/// API base URL
pub const API_URL: &str = "HERITAGE_API_URL";
/// `tracing` filter directive
pub const LOG: &str = "HERITAGE_LOG";
/// Demo session user id
pub const USER_ID: &str = "HERITAGE_USER_ID";
/// Demo session role (`visitor` or `admin`)
pub const USER_ROLE: &str = "HERITAGE_USER_ROLE";
/// Demo session bearer token
pub const TOKEN: &str = "HERITAGE_TOKEN";
/// Seconds to wait for a page to settle
pub const SETTLE_TIMEOUT_SECS: &str = "HERITAGE_SETTLE_TIMEOUT_SECS";
/// Seconds before a notice expires; unset keeps notices until dismissed
pub const NOTICE_TTL_SECS: &str = "HERITAGE_NOTICE_TTL_SECS";

const DEFAULT_SETTLE_TIMEOUT_SECS: u64 = 10;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `HERITAGE_API_URL` is unusable
    #[error(transparent)]
    Api(#[from] BaseUrlError),

    /// The demo identity is malformed
    #[error(transparent)]
    Identity(#[from] AuthError),

    /// A numeric setting did not parse
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    InvalidNumber {
        /// Variable name
        key: &'static str,
        /// Rejected value
        value: String,
    },

    /// Only part of the demo session was configured
    #[error("HERITAGE_USER_ID and HERITAGE_TOKEN must be set together")]
    IncompleteSession,
}

/// Demo session credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Who is signed in
    pub identity: Identity,
    /// Bearer token
    pub token: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Catalog API connection
    pub api: ApiConfig,
    /// Log filter; `None` falls back to `RUST_LOG`, then the built-in default
    pub log_filter: Option<String>,
    /// Signed-in session, if configured
    pub session: Option<SessionConfig>,
    /// How long to wait for a page to settle
    pub settle_timeout: Duration,
    /// Notice lifetime
    pub notice_ttl: Option<Duration>,
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through a lookup function.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Api`]: the API URL is invalid
    /// - [`ConfigError::Identity`]: the user id or role is invalid
    /// - [`ConfigError::InvalidNumber`]: a timeout is not a number
    /// - [`ConfigError::IncompleteSession`]: user id without token or vice versa
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api = ApiConfig::new(&get(API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()))?;

        let session = match (get(USER_ID), get(TOKEN)) {
            (Some(id), Some(token)) => {
                let id: UserId = id.parse()?;
                let role = get(USER_ROLE).map_or(Ok(Role::default()), |r| r.parse::<Role>())?;
                Some(SessionConfig {
                    identity: Identity::new(id, role),
                    token,
                })
            },
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteSession),
        };

        let settle_timeout = seconds(SETTLE_TIMEOUT_SECS, get(SETTLE_TIMEOUT_SECS))?
            .unwrap_or(Duration::from_secs(DEFAULT_SETTLE_TIMEOUT_SECS));
        let notice_ttl = seconds(NOTICE_TTL_SECS, get(NOTICE_TTL_SECS))?;

        Ok(Self {
            api,
            log_filter: get(LOG),
            session,
            settle_timeout,
            notice_ttl,
        })
    }
}

fn seconds(key: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.api.base_url().as_str(), DEFAULT_API_URL);
        assert!(config.session.is_none());
        assert_eq!(config.settle_timeout, Duration::from_secs(10));
        assert!(config.notice_ttl.is_none());
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn test_full_session() {
        let config = load(&[
            (USER_ID, "7"),
            (TOKEN, "secret"),
            (USER_ROLE, "admin"),
            (NOTICE_TTL_SECS, "4"),
        ])
        .unwrap();

        let session = config.session.unwrap();
        assert_eq!(session.identity, Identity::new(UserId(7), Role::Admin));
        assert_eq!(session.token, "secret");
        assert!(!format!("{session:?}").contains("secret"));
        assert_eq!(config.notice_ttl, Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_half_session_is_rejected() {
        assert!(matches!(
            load(&[(USER_ID, "7")]),
            Err(ConfigError::IncompleteSession)
        ));
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            load(&[(USER_ID, "seven"), (TOKEN, "t")]),
            Err(ConfigError::Identity(AuthError::InvalidUserId(_)))
        ));
        assert!(matches!(
            load(&[(SETTLE_TIMEOUT_SECS, "soon")]),
            Err(ConfigError::InvalidNumber { key: SETTLE_TIMEOUT_SECS, .. })
        ));
        assert!(matches!(load(&[(API_URL, "not a url")]), Err(ConfigError::Api(_))));
    }
}
