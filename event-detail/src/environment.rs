//! Injected dependencies of the reconciler.

use crate::directory::DirectoryCache;
use heritage_client::EventApi;
use heritage_auth::SessionProvider;
use heritage_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Environment for [`crate::EventDetailReducer`].
///
/// Generic over the API client and session provider so tests inject the
/// scripted doubles and production injects the HTTP client.
pub struct EventDetailEnvironment<A, S> {
    /// Catalog API
    pub api: Arc<A>,
    /// Session provider, consulted on mount and identity change
    pub session: Arc<S>,
    /// Clock for `loaded_at`
    pub clock: Arc<dyn Clock>,
    /// Shared province lookup
    pub directory: Arc<DirectoryCache>,
    /// How long a notice stays up; `None` keeps it until dismissed
    pub notice_ttl: Option<Duration>,
}

impl<A, S> EventDetailEnvironment<A, S>
where
    A: EventApi,
    S: SessionProvider,
{
    /// Environment with the system clock, an empty directory cache and
    /// notices that stay until dismissed.
    #[must_use]
    pub fn new(api: Arc<A>, session: Arc<S>) -> Self {
        Self {
            api,
            session,
            clock: Arc::new(SystemClock),
            directory: Arc::new(DirectoryCache::new()),
            notice_ttl: None,
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share a directory cache with other environments.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<DirectoryCache>) -> Self {
        self.directory = directory;
        self
    }

    /// Expire notices after `ttl`.
    #[must_use]
    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = Some(ttl);
        self
    }
}

impl<A, S> Clone for EventDetailEnvironment<A, S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: Arc::clone(&self.session),
            clock: Arc::clone(&self.clock),
            directory: Arc::clone(&self.directory),
            notice_ttl: self.notice_ttl,
        }
    }
}
