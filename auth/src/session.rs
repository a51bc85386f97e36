//! In-process session holders.

use crate::providers::SessionProvider;
use crate::state::{Identity, Session};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared, observable session.
///
/// Cloning shares the same underlying session. Every sign-in or sign-out is
/// published to subscribers, which is how the reconciler learns about
/// identity changes while a page is open.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<watch::Sender<Option<Session>>>,
}

impl SharedSession {
    /// Create a session holder with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        let (tx, _) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Create a session holder that starts signed in.
    #[must_use]
    pub fn signed_in(identity: Identity, token: impl Into<String>) -> Self {
        let session = Self::anonymous();
        session.sign_in(identity, token);
        session
    }

    /// Sign in, replacing any previous session.
    pub fn sign_in(&self, identity: Identity, token: impl Into<String>) {
        tracing::debug!(user_id = %identity.id, role = %identity.role, "Session signed in");
        self.inner.send_replace(Some(Session {
            identity,
            token: token.into(),
        }));
    }

    /// Sign out.
    pub fn sign_out(&self) {
        tracing::debug!("Session signed out");
        self.inner.send_replace(None);
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.subscribe()
    }
}

impl Default for SharedSession {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SessionProvider for SharedSession {
    fn identity(&self) -> Option<Identity> {
        self.inner.borrow().as_ref().map(|s| s.identity)
    }

    fn bearer_token(&self) -> Option<String> {
        self.inner.borrow().as_ref().map(|s| s.token.clone())
    }
}

/// Provider for contexts that never authenticate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl SessionProvider for Anonymous {
    fn identity(&self) -> Option<Identity> {
        None
    }

    fn bearer_token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Role, UserId};

    #[test]
    fn test_clones_share_state() {
        let session = SharedSession::anonymous();
        let view = session.clone();

        session.sign_in(Identity::new(UserId(7), Role::Visitor), "t");
        assert_eq!(view.identity().map(|i| i.id), Some(UserId(7)));
        assert_eq!(view.bearer_token().as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_subscribers_see_sign_out() {
        let session = SharedSession::signed_in(Identity::new(UserId(1), Role::Admin), "t");
        let mut rx = session.subscribe();

        session.sign_out();

        assert!(rx.changed().await.is_ok());
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_anonymous_is_never_authenticated() {
        assert!(!Anonymous.is_authenticated());
        assert!(Anonymous.bearer_token().is_none());
    }
}
