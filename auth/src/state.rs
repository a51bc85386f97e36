//! Identity types.
//!
//! All types are `Clone` so they can travel inside reducer actions.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user, as issued by the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| AuthError::InvalidUserId(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular catalog visitor.
    #[default]
    Visitor,
    /// Administrator of the catalog console.
    Admin,
}

impl Role {
    /// Lowercase wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visitor => "visitor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visitor" | "user" => Ok(Self::Visitor),
            "admin" => Ok(Self::Admin),
            _ => Err(AuthError::UnknownRole(s.to_string())),
        }
    }
}

/// The authenticated identity the reconciler gates its operations on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// User identifier.
    pub id: UserId,
    /// User role.
    pub role: Role,
}

impl Identity {
    /// Create an identity.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether this identity may use the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// An identity together with the bearer token proving it.
///
/// `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Who is signed in.
    pub identity: Identity,
    /// Bearer token sent in the `Authorization` header.
    pub token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" visitor ".parse::<Role>(), Ok(Role::Visitor));
        assert_eq!(
            "curator".parse::<Role>(),
            Err(AuthError::UnknownRole("curator".to_string()))
        );
    }

    #[test]
    fn test_user_id_parsing() {
        assert_eq!("7".parse::<UserId>(), Ok(UserId(7)));
        assert!("seven".parse::<UserId>().is_err());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session {
            identity: Identity::new(UserId(7), Role::Visitor),
            token: "secret-token".to_string(),
        };

        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_identity_serializes_role_lowercase() {
        let identity = Identity::new(UserId(3), Role::Admin);
        let json = serde_json::to_string(&identity).unwrap_or_default();
        assert_eq!(json, r#"{"id":3,"role":"admin"}"#);
    }
}
