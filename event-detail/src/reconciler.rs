//! Store-backed façade the presentation shell talks to.

use crate::environment::EventDetailEnvironment;
use crate::reducer::EventDetailReducer;
use crate::types::{EventDetailAction, EventDetailState};
use crate::view::{EventDetailView, RatingSummary};
use heritage_auth::{Session, SessionProvider};
use heritage_client::{EventApi, EventId, RatingId};
use heritage_runtime::{EffectHandle, Store, StoreError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Store running the event-detail reducer.
pub type EventDetailStore<A, S> = Store<
    EventDetailState,
    EventDetailAction,
    EventDetailEnvironment<A, S>,
    EventDetailReducer<A, S>,
>;

/// One reconciler per mounted page.
///
/// Every method only dispatches an action; remote calls run as effects and
/// their results flow back through the reducer. Use [`Self::wait_idle`] to
/// wait for a cascade to settle.
pub struct EventDetailReconciler<A, S>
where
    A: EventApi,
    S: SessionProvider + 'static,
{
    store: EventDetailStore<A, S>,
}

impl<A, S> EventDetailReconciler<A, S>
where
    A: EventApi,
    S: SessionProvider + 'static,
{
    /// Create an unmounted reconciler.
    #[must_use]
    pub fn new(environment: EventDetailEnvironment<A, S>) -> Self {
        Self {
            store: Store::new(
                EventDetailState::default(),
                EventDetailReducer::new(),
                environment,
            ),
        }
    }

    async fn dispatch(&self, action: EventDetailAction) -> Result<EffectHandle, StoreError> {
        self.store.send(action).await
    }

    /// Show an event; a different id discards everything from the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn mount(&self, event_id: EventId) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::Mount { event_id }).await
    }

    /// Join the event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn join(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::Join).await
    }

    /// Leave the event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn leave(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::Leave).await
    }

    /// Save a rating.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn submit_rating(
        &self,
        score: u8,
        comment: impl Into<String>,
    ) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::SubmitRating {
            score,
            comment: comment.into(),
        })
        .await
    }

    /// Update the rating form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn edit_draft(
        &self,
        score: u8,
        comment: impl Into<String>,
    ) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::EditDraft {
            score,
            comment: comment.into(),
        })
        .await
    }

    /// Like a review. Local only; nothing is sent to the server.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn like(&self, rating_id: RatingId) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::LikeReview { rating_id }).await
    }

    /// Clear the current notice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn dismiss_notice(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::DismissNotice).await
    }

    /// Re-read the session provider and resynchronize participation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn identity_changed(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::IdentityChanged).await
    }

    /// Navigate away. Pending results are discarded when they arrive.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn unmount(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(EventDetailAction::Unmount).await
    }

    /// Current view-model.
    pub async fn view(&self) -> EventDetailView {
        self.store.state(EventDetailView::project).await
    }

    /// Current rating summary, when the page is ready.
    pub async fn summary(&self) -> Option<RatingSummary> {
        self.store.state(RatingSummary::project).await
    }

    /// Read the raw state.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&EventDetailState) -> T,
    {
        self.store.state(f).await
    }

    /// Wait for every pending effect, including follow-up refreshes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running.
    pub async fn wait_idle(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.wait_idle(timeout).await
    }

    /// Observe result actions as effects produce them.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventDetailAction> {
        self.store.subscribe_actions()
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &EventDetailStore<A, S> {
        &self.store
    }

    /// Forward session changes as identity changes until the session or the
    /// store goes away.
    #[must_use]
    pub fn watch_session(&self, mut sessions: watch::Receiver<Option<Session>>) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            while sessions.changed().await.is_ok() {
                if let Err(error) = store.send(EventDetailAction::IdentityChanged).await {
                    tracing::debug!(%error, "Session watcher stopped");
                    break;
                }
            }
        })
    }
}

impl<A, S> Clone for EventDetailReconciler<A, S>
where
    A: EventApi,
    S: SessionProvider + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}
