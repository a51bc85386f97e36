//! State and actions for the event-detail reconciler.

use chrono::{DateTime, Utc};
use heritage_auth::{Identity, UserId};
use heritage_client::{
    ApiError, ApiResult, Event, EventId, Rating, RatingAverage, RatingId, UserRatingStatus,
};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Page lifecycle
// ============================================================================

/// Version token captured when a request is issued.
///
/// Results tagged with an older generation belong to a previous event id or
/// page instance and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    /// The next generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Where the page is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Not mounted yet
    #[default]
    Idle,
    /// Initial fetches in flight
    Loading,
    /// Event loaded; aggregates may be degraded
    Ready,
    /// The event itself could not be loaded
    Failed(ApiError),
    /// Navigated away; late results and commands are ignored
    Closed,
}

/// The visitor's relationship to the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Participation {
    /// Not a participant
    #[default]
    NotJoined,
    /// Participant without a rating
    Joined,
    /// Participant who rated the event
    JoinedAndRated,
}

impl Participation {
    /// Derive participation and the user's own rating from a status answer.
    ///
    /// `hasRated` wins over `isJoined`, but only with a usable embedded
    /// rating; a missing or malformed one falls back to [`Self::Joined`].
    #[must_use]
    pub fn from_status(status: &UserRatingStatus) -> (Self, Option<UserRating>) {
        if status.has_rated {
            let rated = status.rating.as_ref().and_then(|rating| {
                rating.valid_score().map(|score| UserRating {
                    score,
                    comment: rating.comment.clone().unwrap_or_default(),
                })
            });

            return match rated {
                Some(rating) => (Self::JoinedAndRated, Some(rating)),
                None => (Self::Joined, None),
            };
        }

        if status.is_joined {
            (Self::Joined, None)
        } else {
            (Self::NotJoined, None)
        }
    }

    /// Whether the visitor is a participant.
    #[must_use]
    pub const fn is_joined(self) -> bool {
        !matches!(self, Self::NotJoined)
    }
}

/// Display name of the event's province.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProvinceLabel {
    /// Not resolved (yet), or resolution failed
    #[default]
    Unknown,
    /// Resolved province name
    Known(String),
}

impl ProvinceLabel {
    /// Text to display.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "Unknown",
            Self::Known(name) => name,
        }
    }
}

impl fmt::Display for ProvinceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// User-facing pieces
// ============================================================================

/// The visitor's saved rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRating {
    /// Score, 1-5
    pub score: u8,
    /// Comment, possibly empty
    pub comment: String,
}

/// The rating form's unsaved input. `score` 0 means "no star picked".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    /// Picked score
    pub score: u8,
    /// Typed comment
    pub comment: String,
}

/// Mutations currently awaiting the server, one flag per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct InFlight {
    /// Participation status being fetched after an identity change
    pub status: bool,
    /// Join request pending
    pub join: bool,
    /// Leave request pending
    pub leave: bool,
    /// Rating submission pending
    pub rate: bool,
}

/// Non-blocking message for the visitor.
///
/// Notices never change the page phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The action needs a signed-in visitor
    SignInRequired,
    /// Rating submitted without picking a score
    ScoreRequired,
    /// Rating rejected as invalid
    InvalidRating(String),
    /// Join failed and was rolled back
    JoinFailed(ApiError),
    /// Leave failed
    LeaveFailed(ApiError),
    /// Rating submission failed; the form keeps its input
    RatingFailed(ApiError),
    /// Participation could not be determined; shown as not joined
    ParticipationUnavailable,
    /// Reviews or the average could not be loaded
    ReviewsUnavailable,
}

impl Notice {
    /// Message for the visitor.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::SignInRequired => "Please sign in to continue.".to_string(),
            Self::ScoreRequired => "Pick a score between 1 and 5.".to_string(),
            Self::InvalidRating(reason) => format!("Your rating was not accepted: {reason}"),
            Self::JoinFailed(e) => format!("Could not join the event: {e}"),
            Self::LeaveFailed(e) => format!("Could not leave the event: {e}"),
            Self::RatingFailed(e) => format!("Could not save your rating: {e}"),
            Self::ParticipationUnavailable => {
                "Your participation could not be loaded.".to_string()
            },
            Self::ReviewsUnavailable => "Reviews are temporarily unavailable.".to_string(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything one page visit knows.
#[derive(Debug, Clone, Default)]
pub struct EventDetailState {
    /// Event this page shows
    pub event_id: Option<EventId>,
    /// Current version token
    pub generation: Generation,
    /// Lifecycle phase
    pub phase: Phase,
    /// Identity the page was last synchronized for
    pub identity: Option<Identity>,
    /// Cached event record
    pub event: Option<Event>,
    /// Province of the event's region
    pub province: ProvinceLabel,
    /// Visitor's participation
    pub participation: Participation,
    /// Visitor's saved rating
    pub my_rating: Option<UserRating>,
    /// Rating form input
    pub draft: Draft,
    /// Ratings, in server order
    pub reviews: Vec<Rating>,
    /// Local-only like counters, keyed by rating
    pub likes: HashMap<RatingId, u32>,
    /// Server average and count
    pub average: RatingAverage,
    /// Pending mutations
    pub in_flight: InFlight,
    /// Current notice
    pub notice: Option<Notice>,
    /// Bumped each time a notice is shown, so an old expiry cannot clear a newer one
    pub notice_seq: u64,
    /// When the page last became ready
    pub loaded_at: Option<DateTime<Utc>>,
}

impl EventDetailState {
    /// Whether a result issued at `generation` still applies.
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation && !matches!(self.phase, Phase::Closed)
    }

    /// Whether a user-specific result still applies.
    #[must_use]
    pub fn is_current_for(&self, generation: Generation, user_id: UserId) -> bool {
        self.is_current(generation) && self.identity.map(|i| i.id) == Some(user_id)
    }

    /// Whether the page is showing a loaded event.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Outcome of the initial all-settled fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLoad {
    /// Event record
    pub event: ApiResult<Event>,
    /// Ratings
    pub ratings: ApiResult<Vec<Rating>>,
    /// Average and count
    pub average: ApiResult<RatingAverage>,
    /// Participation, only fetched with an identity
    pub status: Option<ApiResult<UserRatingStatus>>,
}

/// Commands from the shell and results fed back by effects.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetailAction {
    // ========== Commands ==========
    /// Show an event
    Mount {
        /// Event to show
        event_id: EventId,
    },
    /// The session identity may have changed
    IdentityChanged,
    /// Join the event
    Join,
    /// Leave the event
    Leave,
    /// Save a rating
    SubmitRating {
        /// Score, 1-5
        score: u8,
        /// Comment, may be empty
        comment: String,
    },
    /// Update the rating form without saving
    EditDraft {
        /// Picked score, 0 for none
        score: u8,
        /// Typed comment
        comment: String,
    },
    /// Like a review (local only, never sent to the server)
    LikeReview {
        /// Review to like
        rating_id: RatingId,
    },
    /// Clear the current notice
    DismissNotice,
    /// Navigate away
    Unmount,

    // ========== Results ==========
    /// Initial fetches settled
    PageLoaded {
        /// Token captured at issue time
        generation: Generation,
        /// Identity the status was fetched for
        user_id: Option<UserId>,
        /// All four outcomes
        load: Box<PageLoad>,
    },
    /// Participation re-fetched after an identity change
    StatusLoaded {
        /// Token captured at issue time
        generation: Generation,
        /// Identity the status was fetched for
        user_id: UserId,
        /// Outcome
        result: ApiResult<UserRatingStatus>,
    },
    /// Join call settled
    JoinFinished {
        /// Token captured at issue time
        generation: Generation,
        /// Who joined
        user_id: UserId,
        /// Participation before the optimistic update
        prior: Participation,
        /// Outcome
        result: ApiResult<()>,
    },
    /// Leave call settled
    LeaveFinished {
        /// Token captured at issue time
        generation: Generation,
        /// Who left
        user_id: UserId,
        /// Outcome
        result: ApiResult<()>,
    },
    /// Rating call settled
    RatingFinished {
        /// Token captured at issue time
        generation: Generation,
        /// Who rated
        user_id: UserId,
        /// Submitted score
        score: u8,
        /// Submitted comment
        comment: String,
        /// Outcome
        result: ApiResult<()>,
    },
    /// Event re-fetched after a participation change
    EventRefreshed {
        /// Token captured at issue time
        generation: Generation,
        /// Outcome
        result: ApiResult<Event>,
    },
    /// Ratings re-fetched after a rating change
    RatingsRefreshed {
        /// Token captured at issue time
        generation: Generation,
        /// Outcome
        result: ApiResult<Vec<Rating>>,
    },
    /// Average re-fetched after a rating change
    AverageRefreshed {
        /// Token captured at issue time
        generation: Generation,
        /// Outcome
        result: ApiResult<RatingAverage>,
    },
    /// Province name resolved
    ProvinceResolved {
        /// Token captured at issue time
        generation: Generation,
        /// Resolved label
        province: ProvinceLabel,
    },
    /// A notice's display time ran out
    NoticeExpired {
        /// Sequence number of the notice the timer was set for
        seq: u64,
    },
}

impl EventDetailAction {
    /// Whether this action comes from the shell rather than an effect.
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Mount { .. }
                | Self::IdentityChanged
                | Self::Join
                | Self::Leave
                | Self::SubmitRating { .. }
                | Self::EditDraft { .. }
                | Self::LikeReview { .. }
                | Self::DismissNotice
                | Self::Unmount
        )
    }
}
