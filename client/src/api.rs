//! The operations the event-detail reconciler needs from the catalog API.

use crate::error::ApiResult;
use crate::types::{
    Event, EventId, Province, Rating, RatingAverage, Region, UserRatingStatus,
};
use heritage_auth::UserId;

/// Catalog API operations used by the event-detail view.
///
/// Implemented by [`crate::HttpEventApi`] in production and by a scripted
/// double in tests. Every method is a single request with no retries.
pub trait EventApi: Send + Sync + 'static {
    /// Fetch an event.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such event.
    fn fetch_event(&self, event_id: EventId)
        -> impl std::future::Future<Output = ApiResult<Event>> + Send;

    /// Fetch ratings in server order.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` on transport failure.
    fn fetch_ratings(
        &self,
        event_id: EventId,
    ) -> impl std::future::Future<Output = ApiResult<Vec<Rating>>> + Send;

    /// Fetch the average score and rating count.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` on transport failure.
    fn fetch_average(
        &self,
        event_id: EventId,
    ) -> impl std::future::Future<Output = ApiResult<RatingAverage>> + Send;

    /// Fetch whether a user joined and rated an event.
    ///
    /// A user who never interacted with the event gets a default status, not
    /// an error.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without a valid session, `ServiceUnavailable` on
    /// transport failure.
    fn fetch_user_status(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> impl std::future::Future<Output = ApiResult<UserRatingStatus>> + Send;

    /// Join an event.
    ///
    /// # Errors
    ///
    /// `Conflict` if already joined, `Unauthorized` without a valid session.
    fn join(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = ApiResult<()>> + Send;

    /// Leave an event as the session user.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without a valid session, `NotFound` if not a participant.
    fn leave(&self, event_id: EventId) -> impl std::future::Future<Output = ApiResult<()>> + Send;

    /// Create or update the user's rating.
    ///
    /// # Errors
    ///
    /// `Validation` if the score is outside 1-5 (checked before any request),
    /// `Unauthorized` without a valid session.
    fn submit_rating(
        &self,
        event_id: EventId,
        user_id: UserId,
        score: u8,
        comment: String,
    ) -> impl std::future::Future<Output = ApiResult<()>> + Send;

    /// Fetch every region.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` on transport failure.
    fn fetch_regions(&self) -> impl std::future::Future<Output = ApiResult<Vec<Region>>> + Send;

    /// Fetch every province.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` on transport failure.
    fn fetch_provinces(
        &self,
    ) -> impl std::future::Future<Output = ApiResult<Vec<Province>>> + Send;
}
