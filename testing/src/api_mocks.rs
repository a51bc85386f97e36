//! Scripted catalog API for reconciler tests.

use heritage_auth::UserId;
use heritage_client::{
    ApiError, ApiResult, Event, EventApi, EventId, Province, Rating, RatingAverage, Region,
    UserRatingStatus,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// API operation kinds, used for call counting and gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `fetch_event`
    FetchEvent,
    /// `fetch_ratings`
    FetchRatings,
    /// `fetch_average`
    FetchAverage,
    /// `fetch_user_status`
    FetchUserStatus,
    /// `join`
    Join,
    /// `leave`
    Leave,
    /// `submit_rating`
    SubmitRating,
    /// `fetch_regions`
    FetchRegions,
    /// `fetch_provinces`
    FetchProvinces,
}

/// One recorded call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `fetch_event(event_id)`
    FetchEvent(EventId),
    /// `fetch_ratings(event_id)`
    FetchRatings(EventId),
    /// `fetch_average(event_id)`
    FetchAverage(EventId),
    /// `fetch_user_status(user_id, event_id)`
    FetchUserStatus(UserId, EventId),
    /// `join(event_id, user_id)`
    Join(EventId, UserId),
    /// `leave(event_id)`
    Leave(EventId),
    /// `submit_rating(event_id, user_id, score, comment)`
    SubmitRating {
        /// Event rated
        event_id: EventId,
        /// Rating user
        user_id: UserId,
        /// Submitted score
        score: u8,
        /// Submitted comment
        comment: String,
    },
    /// `fetch_regions()`
    FetchRegions,
    /// `fetch_provinces()`
    FetchProvinces,
}

impl ApiCall {
    /// The operation kind of this call.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::FetchEvent(_) => Operation::FetchEvent,
            Self::FetchRatings(_) => Operation::FetchRatings,
            Self::FetchAverage(_) => Operation::FetchAverage,
            Self::FetchUserStatus(..) => Operation::FetchUserStatus,
            Self::Join(..) => Operation::Join,
            Self::Leave(_) => Operation::Leave,
            Self::SubmitRating { .. } => Operation::SubmitRating,
            Self::FetchRegions => Operation::FetchRegions,
            Self::FetchProvinces => Operation::FetchProvinces,
        }
    }
}

#[derive(Debug)]
struct Script {
    events: HashMap<EventId, ApiResult<Event>>,
    ratings: ApiResult<Vec<Rating>>,
    average: ApiResult<RatingAverage>,
    statuses: HashMap<UserId, ApiResult<UserRatingStatus>>,
    join: ApiResult<()>,
    leave: ApiResult<()>,
    submit_rating: ApiResult<()>,
    regions: ApiResult<Vec<Region>>,
    provinces: ApiResult<Vec<Province>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            events: HashMap::new(),
            ratings: Ok(Vec::new()),
            average: Ok(RatingAverage::default()),
            statuses: HashMap::new(),
            join: Ok(()),
            leave: Ok(()),
            submit_rating: Ok(()),
            regions: Ok(Vec::new()),
            provinces: Ok(Vec::new()),
        }
    }
}

/// Scripted [`EventApi`] double.
///
/// Each operation answers with its configured result on every call; unknown
/// events answer `NotFound`, unknown users get a default status. Every call
/// is recorded before it answers, so a test can observe calls that are still
/// held in flight by [`hold`](Self::hold).
///
/// Clones share the script, the call log and the gates.
#[derive(Debug, Clone)]
pub struct MockEventApi {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
    held: Arc<watch::Sender<HashSet<Operation>>>,
}

impl MockEventApi {
    /// Create a mock with default answers.
    #[must_use]
    pub fn new() -> Self {
        let (held, _) = watch::channel(HashSet::new());
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
            held: Arc::new(held),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Scripting ──────────────────────────────────────────────────────

    /// Serve `event` for its id.
    #[must_use]
    pub fn with_event(self, event: Event) -> Self {
        self.set_event(event.id, Ok(event));
        self
    }

    /// Serve `ratings` for every event.
    #[must_use]
    pub fn with_ratings(self, ratings: Vec<Rating>) -> Self {
        self.set_ratings(Ok(ratings));
        self
    }

    /// Serve `average` for every event.
    #[must_use]
    pub fn with_average(self, average: f64, count: u32) -> Self {
        self.set_average(Ok(RatingAverage { average, count }));
        self
    }

    /// Serve `status` for `user_id`.
    #[must_use]
    pub fn with_status(self, user_id: UserId, status: UserRatingStatus) -> Self {
        self.set_status(user_id, Ok(status));
        self
    }

    /// Serve `regions` and `provinces` for the bulk geography fetch.
    #[must_use]
    pub fn with_geography(self, regions: Vec<Region>, provinces: Vec<Province>) -> Self {
        {
            let mut script = self.script();
            script.regions = Ok(regions);
            script.provinces = Ok(provinces);
        }
        self
    }

    /// Answer `fetch_event(event_id)` with `result`.
    pub fn set_event(&self, event_id: EventId, result: ApiResult<Event>) {
        self.script().events.insert(event_id, result);
    }

    /// Answer `fetch_ratings` with `result`.
    pub fn set_ratings(&self, result: ApiResult<Vec<Rating>>) {
        self.script().ratings = result;
    }

    /// Answer `fetch_average` with `result`.
    pub fn set_average(&self, result: ApiResult<RatingAverage>) {
        self.script().average = result;
    }

    /// Answer `fetch_user_status` for `user_id` with `result`.
    pub fn set_status(&self, user_id: UserId, result: ApiResult<UserRatingStatus>) {
        self.script().statuses.insert(user_id, result);
    }

    /// Answer `join` with `result`.
    pub fn set_join(&self, result: ApiResult<()>) {
        self.script().join = result;
    }

    /// Answer `leave` with `result`.
    pub fn set_leave(&self, result: ApiResult<()>) {
        self.script().leave = result;
    }

    /// Answer `submit_rating` with `result`.
    pub fn set_submit_rating(&self, result: ApiResult<()>) {
        self.script().submit_rating = result;
    }

    /// Answer `fetch_regions` with `result`.
    pub fn set_regions(&self, result: ApiResult<Vec<Region>>) {
        self.script().regions = result;
    }

    // ─── Gates ──────────────────────────────────────────────────────────

    /// Hold calls of `operation` in flight until [`release`](Self::release).
    pub fn hold(&self, operation: Operation) {
        self.held.send_modify(|held| {
            held.insert(operation);
        });
    }

    /// Let held and future calls of `operation` complete.
    pub fn release(&self, operation: Operation) {
        self.held.send_modify(|held| {
            held.remove(&operation);
        });
    }

    // ─── Inspection ─────────────────────────────────────────────────────

    /// Every call so far, in issue order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls of `operation` so far.
    #[must_use]
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Record `call`, wait for its gate, then produce the scripted answer.
    fn answer<T, F>(&self, call: ApiCall, pick: F) -> impl Future<Output = ApiResult<T>> + Send + use<T, F>
    where
        T: Send + 'static,
        F: FnOnce(&Script) -> ApiResult<T> + Send + 'static,
    {
        let operation = call.operation();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        let script = Arc::clone(&self.script);
        let mut gate = self.held.subscribe();

        async move {
            // Sender lives as long as any clone of the mock; a closed gate
            // simply stops holding.
            let _ = gate.wait_for(|held| !held.contains(&operation)).await;
            let script = script.lock().unwrap_or_else(PoisonError::into_inner);
            pick(&script)
        }
    }
}

impl Default for MockEventApi {
    fn default() -> Self {
        Self::new()
    }
}

impl EventApi for MockEventApi {
    fn fetch_event(&self, event_id: EventId) -> impl Future<Output = ApiResult<Event>> + Send {
        self.answer(ApiCall::FetchEvent(event_id), move |script| {
            script
                .events
                .get(&event_id)
                .cloned()
                .unwrap_or(Err(ApiError::NotFound))
        })
    }

    fn fetch_ratings(&self, event_id: EventId) -> impl Future<Output = ApiResult<Vec<Rating>>> + Send {
        self.answer(ApiCall::FetchRatings(event_id), |script| script.ratings.clone())
    }

    fn fetch_average(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = ApiResult<RatingAverage>> + Send {
        self.answer(ApiCall::FetchAverage(event_id), |script| script.average.clone())
    }

    fn fetch_user_status(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> impl Future<Output = ApiResult<UserRatingStatus>> + Send {
        self.answer(ApiCall::FetchUserStatus(user_id, event_id), move |script| {
            script
                .statuses
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| Ok(UserRatingStatus::default()))
        })
    }

    fn join(&self, event_id: EventId, user_id: UserId) -> impl Future<Output = ApiResult<()>> + Send {
        self.answer(ApiCall::Join(event_id, user_id), |script| script.join.clone())
    }

    fn leave(&self, event_id: EventId) -> impl Future<Output = ApiResult<()>> + Send {
        self.answer(ApiCall::Leave(event_id), |script| script.leave.clone())
    }

    fn submit_rating(
        &self,
        event_id: EventId,
        user_id: UserId,
        score: u8,
        comment: String,
    ) -> impl Future<Output = ApiResult<()>> + Send {
        let call = ApiCall::SubmitRating {
            event_id,
            user_id,
            score,
            comment,
        };
        self.answer(call, |script| script.submit_rating.clone())
    }

    fn fetch_regions(&self) -> impl Future<Output = ApiResult<Vec<Region>>> + Send {
        self.answer(ApiCall::FetchRegions, |script| script.regions.clone())
    }

    fn fetch_provinces(&self) -> impl Future<Output = ApiResult<Vec<Province>>> + Send {
        self.answer(ApiCall::FetchProvinces, |script| script.provinces.clone())
    }
}
