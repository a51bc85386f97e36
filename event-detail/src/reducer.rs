//! The event-detail state machine.
//!
//! `Idle → Loading → Ready | Failed`, with `Closed` after unmount. Remote
//! calls are returned as effects; their outcomes come back as result actions
//! tagged with the generation they were issued under.

use crate::environment::EventDetailEnvironment;
use crate::types::{
    Draft, EventDetailAction, EventDetailState, Generation, InFlight, Notice, PageLoad,
    Participation, Phase, ProvinceLabel, UserRating,
};
use heritage_auth::{SessionProvider, UserId};
use heritage_client::{
    ApiError, ApiResult, Event, EventApi, EventId, Rating, RatingAverage, RatingId, RegionId,
    UserRatingStatus, MAX_SCORE, MIN_SCORE,
};
use heritage_core::{async_effect, delay, feedback};
use heritage_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::marker::PhantomData;
use std::sync::Arc;

type Effects = SmallVec<[Effect<EventDetailAction>; 4]>;

/// Reducer for one event-detail page.
pub struct EventDetailReducer<A, S> {
    _marker: PhantomData<fn() -> (A, S)>,
}

impl<A, S> EventDetailReducer<A, S> {
    /// Creates a new `EventDetailReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<A, S> Default for EventDetailReducer<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, S> Clone for EventDetailReducer<A, S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A, S> std::fmt::Debug for EventDetailReducer<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventDetailReducer")
    }
}

impl<A, S> EventDetailReducer<A, S>
where
    A: EventApi,
    S: SessionProvider,
{
    // ========== Effects ==========

    /// One all-settled fetch of event, ratings, average and (with an
    /// identity) participation.
    fn load_page(
        env: &EventDetailEnvironment<A, S>,
        event_id: EventId,
        generation: Generation,
        user_id: Option<UserId>,
    ) -> Effect<EventDetailAction> {
        let api = Arc::clone(&env.api);
        async_effect! {
            let status = async {
                match user_id {
                    Some(user_id) => Some(api.fetch_user_status(user_id, event_id).await),
                    None => None,
                }
            };

            let (event, ratings, average, status) = futures::join!(
                api.fetch_event(event_id),
                api.fetch_ratings(event_id),
                api.fetch_average(event_id),
                status
            );

            Some(EventDetailAction::PageLoaded {
                generation,
                user_id,
                load: Box::new(PageLoad {
                    event,
                    ratings,
                    average,
                    status,
                }),
            })
        }
    }

    fn fetch_status(
        env: &EventDetailEnvironment<A, S>,
        event_id: EventId,
        generation: Generation,
        user_id: UserId,
    ) -> Effect<EventDetailAction> {
        let api = Arc::clone(&env.api);
        feedback!(EventDetailAction::StatusLoaded {
            generation,
            user_id,
            result: api.fetch_user_status(user_id, event_id).await,
        })
    }

    fn refresh_event(
        env: &EventDetailEnvironment<A, S>,
        event_id: EventId,
        generation: Generation,
    ) -> Effect<EventDetailAction> {
        let api = Arc::clone(&env.api);
        feedback!(EventDetailAction::EventRefreshed {
            generation,
            result: api.fetch_event(event_id).await,
        })
    }

    /// Ratings and average, re-fetched concurrently.
    fn refresh_aggregates(
        env: &EventDetailEnvironment<A, S>,
        event_id: EventId,
        generation: Generation,
    ) -> Effect<EventDetailAction> {
        let ratings_api = Arc::clone(&env.api);
        let average_api = Arc::clone(&env.api);
        Effect::merge(vec![
            feedback!(EventDetailAction::RatingsRefreshed {
                generation,
                result: ratings_api.fetch_ratings(event_id).await,
            }),
            feedback!(EventDetailAction::AverageRefreshed {
                generation,
                result: average_api.fetch_average(event_id).await,
            }),
        ])
    }

    fn resolve_province(
        env: &EventDetailEnvironment<A, S>,
        generation: Generation,
        region_id: RegionId,
    ) -> Effect<EventDetailAction> {
        let api = Arc::clone(&env.api);
        let directory = Arc::clone(&env.directory);
        feedback!(EventDetailAction::ProvinceResolved {
            generation,
            province: directory.resolve(api.as_ref(), region_id).await,
        })
    }

    /// Show a notice, scheduling its expiry when notices have a TTL.
    fn notify(
        state: &mut EventDetailState,
        notice: Notice,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        tracing::debug!(?notice, "Notice raised");
        state.notice = Some(notice);
        state.notice_seq += 1;

        match env.notice_ttl {
            Some(duration) => smallvec![delay! {
                duration: duration,
                action: EventDetailAction::NoticeExpired { seq: state.notice_seq }
            }],
            None => SmallVec::new(),
        }
    }

    /// Apply a participation answer; returns a notice when it was unavailable.
    fn apply_status(
        state: &mut EventDetailState,
        result: ApiResult<UserRatingStatus>,
    ) -> Option<Notice> {
        match result {
            Ok(status) => {
                let (participation, rating) = Participation::from_status(&status);
                state.participation = participation;
                state.my_rating = rating;
                None
            },
            // No participation record for this user
            Err(ApiError::NotFound) => {
                state.participation = Participation::NotJoined;
                state.my_rating = None;
                None
            },
            Err(error) => {
                tracing::warn!(%error, "Participation unavailable, treating as not joined");
                state.participation = Participation::NotJoined;
                state.my_rating = None;
                Some(Notice::ParticipationUnavailable)
            },
        }
    }

    /// Who is acting on which event, when someone is signed in.
    fn signed_in(state: &EventDetailState) -> Option<(UserId, EventId)> {
        state.identity.map(|i| i.id).zip(state.event_id)
    }

    // ========== Commands ==========

    fn mount(
        state: &mut EventDetailState,
        event_id: EventId,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if state.event_id == Some(event_id) && matches!(state.phase, Phase::Loading | Phase::Ready) {
            tracing::debug!(%event_id, "Already mounted");
            return SmallVec::new();
        }

        let generation = state.generation.next();
        let identity = env.session.identity();

        *state = EventDetailState {
            event_id: Some(event_id),
            generation,
            phase: Phase::Loading,
            identity,
            notice_seq: state.notice_seq,
            ..EventDetailState::default()
        };

        tracing::debug!(
            %event_id,
            %generation,
            authenticated = identity.is_some(),
            "Loading event page"
        );

        smallvec![Self::load_page(env, event_id, generation, identity.map(|i| i.id))]
    }

    fn identity_changed(state: &mut EventDetailState, env: &EventDetailEnvironment<A, S>) -> Effects {
        let identity = env.session.identity();
        if identity == state.identity {
            return SmallVec::new();
        }

        tracing::debug!(
            user_id = ?identity.map(|i| i.id),
            "Identity changed, resetting participation"
        );

        state.identity = identity;
        state.participation = Participation::NotJoined;
        state.my_rating = None;
        state.draft = Draft::default();
        state.in_flight = InFlight::default();
        state.notice = None;

        let Some(event_id) = state.event_id else {
            return SmallVec::new();
        };

        match identity {
            // The pending load fetched status for the previous identity
            _ if state.phase == Phase::Loading => {
                state.generation = state.generation.next();
                smallvec![Self::load_page(
                    env,
                    event_id,
                    state.generation,
                    identity.map(|i| i.id)
                )]
            },
            Some(identity) if state.is_ready() => {
                state.in_flight.status = true;
                smallvec![Self::fetch_status(env, event_id, state.generation, identity.id)]
            },
            _ => SmallVec::new(),
        }
    }

    fn join(state: &mut EventDetailState, env: &EventDetailEnvironment<A, S>) -> Effects {
        if !state.is_ready() {
            tracing::debug!(phase = ?state.phase, "Join ignored, page not ready");
            return SmallVec::new();
        }

        let Some((user_id, event_id)) = Self::signed_in(state) else {
            return Self::notify(state, Notice::SignInRequired, env);
        };

        if state.in_flight.join || state.in_flight.status {
            tracing::debug!("Join ignored, request already in flight");
            return SmallVec::new();
        }

        if state.participation.is_joined() {
            tracing::debug!("Join ignored, already joined");
            return SmallVec::new();
        }

        let prior = state.participation;
        state.participation = Participation::Joined;
        state.in_flight.join = true;

        let api = Arc::clone(&env.api);
        let generation = state.generation;
        smallvec![feedback!(EventDetailAction::JoinFinished {
            generation,
            user_id,
            prior,
            result: api.join(event_id, user_id).await,
        })]
    }

    fn leave(state: &mut EventDetailState, env: &EventDetailEnvironment<A, S>) -> Effects {
        if !state.is_ready() {
            tracing::debug!(phase = ?state.phase, "Leave ignored, page not ready");
            return SmallVec::new();
        }

        let Some((user_id, event_id)) = Self::signed_in(state) else {
            return Self::notify(state, Notice::SignInRequired, env);
        };

        // A leave cannot overtake a pending join or rating
        if state.in_flight.leave
            || state.in_flight.join
            || state.in_flight.rate
            || state.in_flight.status
        {
            tracing::debug!("Leave ignored, request already in flight");
            return SmallVec::new();
        }

        if !state.participation.is_joined() {
            tracing::debug!("Leave ignored, not joined");
            return SmallVec::new();
        }

        state.in_flight.leave = true;

        let api = Arc::clone(&env.api);
        let generation = state.generation;
        smallvec![feedback!(EventDetailAction::LeaveFinished {
            generation,
            user_id,
            result: api.leave(event_id).await,
        })]
    }

    fn submit_rating(
        state: &mut EventDetailState,
        score: u8,
        comment: String,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_ready() {
            tracing::debug!(phase = ?state.phase, "Rating ignored, page not ready");
            return SmallVec::new();
        }

        // The form keeps whatever was submitted until a save succeeds
        state.draft = Draft {
            score,
            comment: comment.clone(),
        };

        let Some((user_id, event_id)) = Self::signed_in(state) else {
            return Self::notify(state, Notice::SignInRequired, env);
        };

        if score == 0 {
            return Self::notify(state, Notice::ScoreRequired, env);
        }

        if score > MAX_SCORE {
            return Self::notify(
                state,
                Notice::InvalidRating(format!(
                    "score must be between {MIN_SCORE} and {MAX_SCORE}"
                )),
                env,
            );
        }

        if state.in_flight.rate
            || state.in_flight.join
            || state.in_flight.leave
            || state.in_flight.status
        {
            tracing::debug!("Rating ignored, request already in flight");
            return SmallVec::new();
        }

        if !state.participation.is_joined() {
            tracing::debug!("Rating ignored, not joined");
            return SmallVec::new();
        }

        state.in_flight.rate = true;

        let api = Arc::clone(&env.api);
        let generation = state.generation;
        smallvec![async_effect! {
            let result = api.submit_rating(event_id, user_id, score, comment.clone()).await;
            Some(EventDetailAction::RatingFinished {
                generation,
                user_id,
                score,
                comment,
                result,
            })
        }]
    }

    fn like_review(state: &mut EventDetailState, rating_id: RatingId) {
        if !state.is_ready() || !state.reviews.iter().any(|r| r.id == rating_id) {
            tracing::debug!(%rating_id, "Like ignored, no such review");
            return;
        }

        *state.likes.entry(rating_id).or_insert(0) += 1;
    }

    fn unmount(state: &mut EventDetailState) {
        tracing::debug!(event_id = ?state.event_id, "Page closed");

        *state = EventDetailState {
            generation: state.generation.next(),
            phase: Phase::Closed,
            notice_seq: state.notice_seq,
            ..EventDetailState::default()
        };
    }

    // ========== Results ==========

    fn page_loaded(
        state: &mut EventDetailState,
        generation: Generation,
        user_id: Option<UserId>,
        load: PageLoad,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        let loaded_for_current_user = state.identity.map(|i| i.id) == user_id;
        if !state.is_current(generation) || state.phase != Phase::Loading || !loaded_for_current_user {
            tracing::debug!(%generation, current = %state.generation, "Stale page load dropped");
            return SmallVec::new();
        }

        let PageLoad {
            event,
            ratings,
            average,
            status,
        } = load;

        let event = match event {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(event_id = ?state.event_id, %error, "Event unavailable");
                state.phase = Phase::Failed(error);
                return SmallVec::new();
            },
        };

        let mut degraded = None;

        state.reviews = ratings.unwrap_or_else(|error| {
            tracing::warn!(%error, "Ratings unavailable, showing none");
            degraded = Some(Notice::ReviewsUnavailable);
            Vec::new()
        });

        state.average = average.unwrap_or_else(|error| {
            tracing::warn!(%error, "Average unavailable, showing 0");
            degraded = Some(Notice::ReviewsUnavailable);
            RatingAverage::default()
        });

        if let Some(notice) = status.and_then(|result| Self::apply_status(state, result)) {
            degraded = Some(notice);
        }

        let region_id = event.region_id;
        state.event = Some(event);
        state.phase = Phase::Ready;
        state.loaded_at = Some(env.clock.now());

        tracing::debug!(
            event_id = ?state.event_id,
            participation = ?state.participation,
            reviews = state.reviews.len(),
            "Event page ready"
        );

        let mut effects = SmallVec::new();
        if let Some(region_id) = region_id {
            effects.push(Self::resolve_province(env, generation, region_id));
        }
        if let Some(notice) = degraded {
            effects.extend(Self::notify(state, notice, env));
        }
        effects
    }

    fn status_loaded(
        state: &mut EventDetailState,
        generation: Generation,
        user_id: UserId,
        result: ApiResult<UserRatingStatus>,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_current_for(generation, user_id) {
            tracing::debug!(%user_id, "Stale participation status dropped");
            return SmallVec::new();
        }

        state.in_flight.status = false;
        match Self::apply_status(state, result) {
            Some(notice) => Self::notify(state, notice, env),
            None => SmallVec::new(),
        }
    }

    fn join_finished(
        state: &mut EventDetailState,
        generation: Generation,
        user_id: UserId,
        prior: Participation,
        result: ApiResult<()>,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_current_for(generation, user_id) {
            tracing::debug!(%user_id, "Stale join result dropped");
            return SmallVec::new();
        }

        state.in_flight.join = false;

        match result {
            Ok(()) | Err(ApiError::Conflict) => {
                state.participation = state.participation.max_joined();
                match state.event_id {
                    Some(event_id) => smallvec![Self::refresh_event(env, event_id, generation)],
                    None => SmallVec::new(),
                }
            },
            Err(ApiError::Unauthorized) => {
                Self::roll_back_join(state, prior);
                Self::notify(state, Notice::SignInRequired, env)
            },
            Err(error) => {
                tracing::warn!(%error, "Join failed, rolling back");
                Self::roll_back_join(state, prior);
                Self::notify(state, Notice::JoinFailed(error), env)
            },
        }
    }

    fn roll_back_join(state: &mut EventDetailState, prior: Participation) {
        state.participation = prior;
        if !prior.is_joined() {
            state.my_rating = None;
        }
    }

    fn leave_finished(
        state: &mut EventDetailState,
        generation: Generation,
        user_id: UserId,
        result: ApiResult<()>,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_current_for(generation, user_id) {
            tracing::debug!(%user_id, "Stale leave result dropped");
            return SmallVec::new();
        }

        state.in_flight.leave = false;

        match result {
            // NotFound: already not a participant
            Ok(()) | Err(ApiError::NotFound) => {
                state.participation = Participation::NotJoined;
                state.my_rating = None;
                state.draft = Draft::default();
                match state.event_id {
                    Some(event_id) => smallvec![Self::refresh_event(env, event_id, generation)],
                    None => SmallVec::new(),
                }
            },
            Err(ApiError::Unauthorized) => Self::notify(state, Notice::SignInRequired, env),
            Err(error) => {
                tracing::warn!(%error, "Leave failed");
                Self::notify(state, Notice::LeaveFailed(error), env)
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn rating_finished(
        state: &mut EventDetailState,
        generation: Generation,
        user_id: UserId,
        score: u8,
        comment: String,
        result: ApiResult<()>,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_current_for(generation, user_id) {
            tracing::debug!(%user_id, "Stale rating result dropped");
            return SmallVec::new();
        }

        state.in_flight.rate = false;

        match result {
            // Participation ended while the rating was on its way
            Ok(()) if !state.participation.is_joined() => {
                tracing::debug!("Rating saved after leaving, not shown as rated");
                state.draft = Draft::default();
                SmallVec::new()
            },
            Ok(()) => {
                state.participation = Participation::JoinedAndRated;
                state.my_rating = Some(UserRating { score, comment });
                state.draft = Draft::default();
                match state.event_id {
                    Some(event_id) => {
                        smallvec![Self::refresh_aggregates(env, event_id, generation)]
                    },
                    None => SmallVec::new(),
                }
            },
            Err(ApiError::Validation(reason)) => {
                Self::notify(state, Notice::InvalidRating(reason), env)
            },
            Err(ApiError::Unauthorized) => Self::notify(state, Notice::SignInRequired, env),
            Err(error) => {
                tracing::warn!(%error, "Rating failed, keeping the form");
                Self::notify(state, Notice::RatingFailed(error), env)
            },
        }
    }

    fn event_refreshed(state: &mut EventDetailState, generation: Generation, result: ApiResult<Event>) {
        if !state.is_current(generation) {
            tracing::debug!(%generation, "Stale event refresh dropped");
            return;
        }

        match result {
            Ok(event) => state.event = Some(event),
            Err(error) => tracing::warn!(%error, "Event refresh failed, keeping cached event"),
        }
    }

    fn ratings_refreshed(
        state: &mut EventDetailState,
        generation: Generation,
        result: ApiResult<Vec<Rating>>,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_current(generation) {
            tracing::debug!(%generation, "Stale ratings dropped");
            return SmallVec::new();
        }

        match result {
            Ok(ratings) => {
                state.reviews = ratings;
                SmallVec::new()
            },
            Err(error) => {
                tracing::warn!(%error, "Ratings refresh failed, keeping previous list");
                Self::notify(state, Notice::ReviewsUnavailable, env)
            },
        }
    }

    fn average_refreshed(
        state: &mut EventDetailState,
        generation: Generation,
        result: ApiResult<RatingAverage>,
        env: &EventDetailEnvironment<A, S>,
    ) -> Effects {
        if !state.is_current(generation) {
            tracing::debug!(%generation, "Stale average dropped");
            return SmallVec::new();
        }

        match result {
            Ok(average) => {
                state.average = average;
                SmallVec::new()
            },
            Err(error) => {
                tracing::warn!(%error, "Average refresh failed, keeping previous value");
                Self::notify(state, Notice::ReviewsUnavailable, env)
            },
        }
    }

    fn province_resolved(state: &mut EventDetailState, generation: Generation, province: ProvinceLabel) {
        if state.is_current(generation) {
            state.province = province;
        }
    }
}

impl Participation {
    /// `NotJoined` becomes `Joined`; joined states are kept.
    const fn max_joined(self) -> Self {
        match self {
            Self::NotJoined => Self::Joined,
            other => other,
        }
    }
}

impl<A, S> Reducer for EventDetailReducer<A, S>
where
    A: EventApi,
    S: SessionProvider,
{
    type State = EventDetailState;
    type Action = EventDetailAction;
    type Environment = EventDetailEnvironment<A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if action.is_command() {
            tracing::trace!(?action, phase = ?state.phase, "Command received");
        }

        match action {
            // ========== Commands ==========
            EventDetailAction::Mount { event_id } => Self::mount(state, event_id, env),
            EventDetailAction::IdentityChanged => Self::identity_changed(state, env),
            EventDetailAction::Join => Self::join(state, env),
            EventDetailAction::Leave => Self::leave(state, env),
            EventDetailAction::SubmitRating { score, comment } => {
                Self::submit_rating(state, score, comment, env)
            },
            EventDetailAction::EditDraft { score, comment } => {
                if state.is_ready() {
                    state.draft = Draft { score, comment };
                }
                SmallVec::new()
            },
            EventDetailAction::LikeReview { rating_id } => {
                Self::like_review(state, rating_id);
                SmallVec::new()
            },
            EventDetailAction::DismissNotice => {
                state.notice = None;
                SmallVec::new()
            },
            EventDetailAction::Unmount => {
                Self::unmount(state);
                SmallVec::new()
            },

            // ========== Results ==========
            EventDetailAction::PageLoaded {
                generation,
                user_id,
                load,
            } => Self::page_loaded(state, generation, user_id, *load, env),
            EventDetailAction::StatusLoaded {
                generation,
                user_id,
                result,
            } => Self::status_loaded(state, generation, user_id, result, env),
            EventDetailAction::JoinFinished {
                generation,
                user_id,
                prior,
                result,
            } => Self::join_finished(state, generation, user_id, prior, result, env),
            EventDetailAction::LeaveFinished {
                generation,
                user_id,
                result,
            } => Self::leave_finished(state, generation, user_id, result, env),
            EventDetailAction::RatingFinished {
                generation,
                user_id,
                score,
                comment,
                result,
            } => Self::rating_finished(state, generation, user_id, score, comment, result, env),
            EventDetailAction::EventRefreshed { generation, result } => {
                Self::event_refreshed(state, generation, result);
                SmallVec::new()
            },
            EventDetailAction::RatingsRefreshed { generation, result } => {
                Self::ratings_refreshed(state, generation, result, env)
            },
            EventDetailAction::AverageRefreshed { generation, result } => {
                Self::average_refreshed(state, generation, result, env)
            },
            EventDetailAction::ProvinceResolved {
                generation,
                province,
            } => {
                Self::province_resolved(state, generation, province);
                SmallVec::new()
            },
            EventDetailAction::NoticeExpired { seq } => {
                if seq == state.notice_seq {
                    state.notice = None;
                }
                SmallVec::new()
            },
        }
    }
}
