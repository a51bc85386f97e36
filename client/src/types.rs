//! Wire types for the catalog API.
//!
//! All bodies are camelCase JSON. Optional fields default when absent so that
//! older servers omitting a field do not fail decoding.

use chrono::{DateTime, Utc};
use heritage_auth::UserId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Lowest accepted rating score.
pub const MIN_SCORE: u8 = 1;

/// Highest accepted rating score.
pub const MAX_SCORE: u8 = 5;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for an event.
    EventId
);
numeric_id!(
    /// Unique identifier for a rating.
    RatingId
);
numeric_id!(
    /// Unique identifier for a region.
    RegionId
);
numeric_id!(
    /// Unique identifier for a province.
    ProvinceId
);

// ═══════════════════════════════════════════════════════════════════════
// Event
// ═══════════════════════════════════════════════════════════════════════

/// Event projection as returned by `GET events/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Image reference (URL or asset key)
    #[serde(default)]
    pub image: Option<String>,
    /// Date as published by the catalog
    #[serde(default)]
    pub date: String,
    /// Venue
    #[serde(default)]
    pub location: String,
    /// Region the event belongs to
    #[serde(default)]
    pub region_id: Option<RegionId>,
    /// Server-computed number of participants
    #[serde(default)]
    pub attendee_count: u32,
}

// ═══════════════════════════════════════════════════════════════════════
// Ratings
// ═══════════════════════════════════════════════════════════════════════

/// Author of a rating.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAuthor {
    /// Public username
    pub username: String,
    /// Avatar reference
    #[serde(default)]
    pub avatar: Option<String>,
}

/// One published rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    /// Rating identifier
    pub id: RatingId,
    /// Who wrote it
    #[serde(default)]
    pub user: RatingAuthor,
    /// Score, 1-5
    #[serde(rename = "rating")]
    pub score: u8,
    /// Free-text review
    #[serde(default)]
    pub comment: Option<String>,
    /// When it was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Average score and review count for an event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAverage {
    /// Mean score, 0 when there are no ratings
    #[serde(default, alias = "averageRating")]
    pub average: f64,
    /// Number of ratings
    #[serde(default, alias = "totalRatings")]
    pub count: u32,
}

/// Rating embedded in a user status answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRating {
    /// Score the user gave, if any
    #[serde(default)]
    pub rating: Option<i64>,
    /// Comment the user gave, if any
    #[serde(default)]
    pub comment: Option<String>,
}

impl StatusRating {
    /// The score, when it is within the accepted range.
    #[must_use]
    pub fn valid_score(&self) -> Option<u8> {
        self.rating
            .and_then(|r| u8::try_from(r).ok())
            .filter(|s| (MIN_SCORE..=MAX_SCORE).contains(s))
    }
}

/// Per-user participation answer from `GET users/{uid}/events/{id}/rating-status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRatingStatus {
    /// Whether the user joined the event
    #[serde(default)]
    pub is_joined: bool,
    /// Whether the user rated the event
    #[serde(default)]
    pub has_rated: bool,
    /// The user's rating; malformed payloads decode to `None`
    #[serde(default, deserialize_with = "lenient_status_rating")]
    pub rating: Option<StatusRating>,
}

fn lenient_status_rating<'de, D>(deserializer: D) -> Result<Option<StatusRating>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Body of `POST events/{id}/ratings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    /// Who is rating
    pub user_id: UserId,
    /// Score, 1-5
    pub rating: u8,
    /// Review text, may be empty
    pub comment: String,
}

/// Body of `POST events/{id}/participants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinRequest {
    pub user_id: UserId,
}

// ═══════════════════════════════════════════════════════════════════════
// Geography
// ═══════════════════════════════════════════════════════════════════════

/// Region entry from `GET regions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Region identifier
    pub id: RegionId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Owning province
    pub province_id: ProvinceId,
}

/// Province entry from `GET provinces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    /// Province identifier
    pub id: ProvinceId,
    /// Display name
    pub name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_defaults_optional_fields() {
        let event: Event = serde_json::from_str(r#"{"id":42,"name":"Lantern Festival"}"#).unwrap();
        assert_eq!(event.id, EventId(42));
        assert_eq!(event.attendee_count, 0);
        assert!(event.region_id.is_none());
    }

    #[test]
    fn test_rating_reads_score_from_rating_field() {
        let rating: Rating = serde_json::from_str(
            r#"{"id":1,"user":{"username":"ana","avatar":null},"rating":4,"comment":"Nice","createdAt":"2025-01-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(rating.score, 4);
        assert_eq!(rating.user.username, "ana");
        assert!(rating.created_at.is_some());
    }

    #[test]
    fn test_status_with_embedded_rating() {
        let status: UserRatingStatus = serde_json::from_str(
            r#"{"isJoined":true,"hasRated":true,"rating":{"rating":4,"comment":"Nice"}}"#,
        )
        .unwrap();
        let rating = status.rating.unwrap();
        assert_eq!(rating.valid_score(), Some(4));
        assert_eq!(rating.comment.as_deref(), Some("Nice"));
    }

    #[test]
    fn test_malformed_embedded_rating_is_none() {
        let status: UserRatingStatus =
            serde_json::from_str(r#"{"hasRated":true,"rating":"four stars"}"#).unwrap();
        assert!(status.has_rated);
        assert!(!status.is_joined);
        assert!(status.rating.is_none());
    }

    #[test]
    fn test_out_of_range_score_is_not_valid() {
        let rating = StatusRating {
            rating: Some(9),
            comment: None,
        };
        assert_eq!(rating.valid_score(), None);
        assert_eq!(StatusRating::default().valid_score(), None);
    }

    #[test]
    fn test_average_accepts_alternate_field_names() {
        let average: RatingAverage =
            serde_json::from_str(r#"{"averageRating":4.25,"totalRatings":4}"#).unwrap();
        assert!((average.average - 4.25).abs() < f64::EPSILON);
        assert_eq!(average.count, 4);
    }

    #[test]
    fn test_submission_is_camel_case() {
        let body = RatingSubmission {
            user_id: UserId(7),
            rating: 3,
            comment: "Great!".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"userId":7,"rating":3,"comment":"Great!"}"#
        );
    }
}
