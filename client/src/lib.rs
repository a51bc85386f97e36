//! # Heritage API Client
//!
//! Thin typed wrapper over the catalog REST API used by the event-detail
//! view. No business logic lives here: every operation is one request, one
//! status mapping, one decode.
//!
//! - [`EventApi`]: the operations the reconciler depends on
//! - [`HttpEventApi`]: the `reqwest` implementation
//! - [`ApiError`]: failure taxonomy shared by every implementation

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use api::EventApi;
pub use config::{ApiConfig, BaseUrlError, DEFAULT_API_URL};
pub use error::{ApiError, ApiResult};
pub use http::HttpEventApi;
pub use types::{
    Event, EventId, Province, ProvinceId, Rating, RatingAuthor, RatingAverage, RatingId,
    RatingSubmission, Region, RegionId, StatusRating, UserRatingStatus, MAX_SCORE, MIN_SCORE,
};
