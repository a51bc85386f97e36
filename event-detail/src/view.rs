//! Read-only projections of [`EventDetailState`] for the presentation shell.

use crate::types::{Draft, EventDetailState, InFlight, Notice, Participation, Phase};
use chrono::{DateTime, Utc};
use heritage_client::{ApiError, Event, RatingId, MAX_SCORE};

/// One displayed review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    /// Rating id, used to like the review
    pub id: RatingId,
    /// Author name
    pub username: String,
    /// Author avatar URL
    pub avatar: Option<String>,
    /// Score, 1-5
    pub score: u8,
    /// Comment; empty when none was left
    pub comment: String,
    /// When the rating was written
    pub created_at: Option<DateTime<Utc>>,
    /// Local like counter.
    ///
    /// Not persisted: there is no likes endpoint, so the count lives only as
    /// long as the page visit and resets on remount.
    pub likes: u32,
}

impl ReviewRow {
    /// Score as five stars, filled first: `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::from(self.score.min(MAX_SCORE));
        let empty = usize::from(MAX_SCORE) - filled;
        "★".repeat(filled) + &"☆".repeat(empty)
    }
}

/// Average, review count and review rows of a ready page.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    /// Server average, untruncated
    pub average: f64,
    /// Server review count
    pub review_count: u32,
    /// Reviews in server order
    pub rows: Vec<ReviewRow>,
}

impl RatingSummary {
    /// Project a ready page; `None` in any other phase.
    #[must_use]
    pub fn project(state: &EventDetailState) -> Option<Self> {
        if !state.is_ready() {
            return None;
        }

        let rows = state
            .reviews
            .iter()
            .map(|rating| ReviewRow {
                id: rating.id,
                username: rating.user.username.clone(),
                avatar: rating.user.avatar.clone(),
                score: rating.score,
                comment: rating.comment.clone().unwrap_or_default(),
                created_at: rating.created_at,
                likes: state.likes.get(&rating.id).copied().unwrap_or(0),
            })
            .collect();

        Some(Self {
            average: state.average.average,
            review_count: state.average.count,
            rows,
        })
    }

    /// Average rounded to one decimal.
    #[must_use]
    pub fn average_rounded(&self) -> f64 {
        (self.average * 10.0).round() / 10.0
    }

    /// Average formatted for display, e.g. `"4.3"`.
    #[must_use]
    pub fn average_label(&self) -> String {
        format!("{:.1}", self.average_rounded())
    }
}

/// Everything the shell renders for one page.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EventDetailView {
    /// Visitor's participation
    pub participation: Participation,
    /// Server average, untruncated
    pub average_rating: f64,
    /// Server review count
    pub review_count: u32,
    /// Reviews in server order
    pub reviews: Vec<ReviewRow>,
    /// Event record, once loaded
    pub event: Option<Event>,
    /// Province name, `"Unknown"` until resolved
    pub province: String,
    /// Initial fetches in flight
    pub is_loading: bool,
    /// Page-level error; only the event fetch produces one
    pub error: Option<ApiError>,
    /// Visitor's saved score, 0 when none
    pub user_rating: u8,
    /// Visitor's saved comment, empty when none
    pub user_comment: String,
    /// Unsaved form input
    pub draft: Draft,
    /// Pending mutations
    pub in_flight: InFlight,
    /// Current notice
    pub notice: Option<Notice>,
    /// Join button enabled
    pub can_join: bool,
    /// Leave button enabled
    pub can_leave: bool,
    /// Rating form enabled
    pub can_rate: bool,
}

impl EventDetailView {
    /// Project any state.
    #[must_use]
    pub fn project(state: &EventDetailState) -> Self {
        let summary = RatingSummary::project(state);
        let ready = state.is_ready();
        let joined = state.participation.is_joined();
        let in_flight = state.in_flight;

        Self {
            participation: state.participation,
            average_rating: summary.as_ref().map_or(0.0, |s| s.average),
            review_count: summary.as_ref().map_or(0, |s| s.review_count),
            reviews: summary.map(|s| s.rows).unwrap_or_default(),
            event: state.event.clone(),
            province: state.province.as_str().to_string(),
            is_loading: state.phase == Phase::Loading,
            error: match &state.phase {
                Phase::Failed(error) => Some(error.clone()),
                _ => None,
            },
            user_rating: state.my_rating.as_ref().map_or(0, |r| r.score),
            user_comment: state
                .my_rating
                .as_ref()
                .map(|r| r.comment.clone())
                .unwrap_or_default(),
            draft: state.draft.clone(),
            in_flight,
            notice: state.notice.clone(),
            // Signed-out visitors may press Join; it answers with a sign-in prompt
            can_join: ready && !joined && !in_flight.join && !in_flight.status,
            can_leave: ready
                && joined
                && !in_flight.leave
                && !in_flight.join
                && !in_flight.rate
                && !in_flight.status,
            can_rate: ready
                && joined
                && !in_flight.rate
                && !in_flight.join
                && !in_flight.leave
                && !in_flight.status,
        }
    }

    /// Notice text, if any.
    #[must_use]
    pub fn notice_message(&self) -> Option<String> {
        self.notice.as_ref().map(Notice::message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::{Generation, ProvinceLabel, UserRating};
    use heritage_client::{EventId, RatingAverage};
    use heritage_testing::properties;
    use proptest::prelude::*;

    fn ready_with(reviews: Vec<heritage_client::Rating>, average: RatingAverage) -> EventDetailState {
        EventDetailState {
            event_id: Some(EventId(42)),
            generation: Generation(1),
            phase: Phase::Ready,
            reviews,
            average,
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_only_when_ready() {
        let state = EventDetailState {
            phase: Phase::Loading,
            ..Default::default()
        };
        assert!(RatingSummary::project(&state).is_none());
    }

    #[test]
    fn test_average_label_rounds_one_decimal() {
        let state = ready_with(
            Vec::new(),
            RatingAverage {
                average: 4.25,
                count: 4,
            },
        );
        let summary = RatingSummary::project(&state).unwrap();

        assert_eq!(summary.average, 4.25);
        assert_eq!(summary.average_label(), "4.3");
        assert_eq!(summary.review_count, 4);
    }

    #[test]
    fn test_failed_page_exposes_error() {
        let state = EventDetailState {
            phase: Phase::Failed(ApiError::NotFound),
            ..Default::default()
        };
        let view = EventDetailView::project(&state);

        assert_eq!(view.error, Some(ApiError::NotFound));
        assert!(!view.is_loading);
        assert!(!view.can_join);
        assert_eq!(view.province, "Unknown");
    }

    #[test]
    fn test_user_rating_defaults_to_zero() {
        let mut state = ready_with(Vec::new(), RatingAverage::default());
        assert_eq!(EventDetailView::project(&state).user_rating, 0);
        assert_eq!(EventDetailView::project(&state).user_comment, "");

        state.participation = Participation::JoinedAndRated;
        state.my_rating = Some(UserRating {
            score: 4,
            comment: "Nice".to_string(),
        });
        state.province = ProvinceLabel::Known("North".to_string());
        let view = EventDetailView::project(&state);

        assert_eq!(view.user_rating, 4);
        assert_eq!(view.user_comment, "Nice");
        assert_eq!(view.province, "North");
        assert!(view.can_leave);
        assert!(!view.can_join);
    }

    #[test]
    fn test_guarded_controls_while_in_flight() {
        let mut state = ready_with(Vec::new(), RatingAverage::default());
        state.in_flight.join = true;
        state.participation = Participation::Joined;

        let view = EventDetailView::project(&state);
        assert!(!view.can_join);
        assert!(!view.can_leave);
        assert!(!view.can_rate);

        state.in_flight.join = false;
        state.in_flight.rate = true;
        let view = EventDetailView::project(&state);
        assert!(!view.can_leave);
        assert!(!view.can_rate);

        state.in_flight.rate = false;
        assert!(EventDetailView::project(&state).can_rate);
        state.participation = Participation::NotJoined;
        assert!(!EventDetailView::project(&state).can_rate);
    }

    proptest! {
        #[test]
        fn prop_rows_follow_server_order(reviews in properties::ratings(12)) {
            let state = ready_with(reviews.clone(), RatingAverage::default());
            let summary = RatingSummary::project(&state).unwrap();

            let ids: Vec<_> = summary.rows.iter().map(|row| row.id).collect();
            let expected: Vec<_> = reviews.iter().map(|rating| rating.id).collect();
            prop_assert_eq!(ids, expected);
        }

        #[test]
        fn prop_stars_are_five_wide(reviews in properties::ratings(8)) {
            let state = ready_with(reviews, RatingAverage::default());
            for row in RatingSummary::project(&state).unwrap().rows {
                prop_assert_eq!(row.stars().chars().count(), 5);
                prop_assert_eq!(
                    row.stars().chars().filter(|c| *c == '★').count(),
                    usize::from(row.score)
                );
            }
        }

        #[test]
        fn prop_rounding_stays_within_half_a_tenth(average in 0.0f64..=5.0) {
            let summary = RatingSummary {
                average,
                review_count: 1,
                rows: Vec::new(),
            };
            prop_assert!((summary.average_rounded() - average).abs() <= 0.05 + f64::EPSILON);
        }
    }
}
