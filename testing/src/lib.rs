//! # Heritage Testing
//!
//! Testing utilities for the Heritage workspace.
//!
//! This crate provides:
//! - [`FixedClock`] for deterministic timestamps
//! - [`ReducerTest`] for Given-When-Then reducer tests
//! - [`MockEventApi`], a scripted catalog API with call recording and gates
//! - proptest strategies for catalog wire types
//!
//! ## Example
//!
//! ```ignore
//! use heritage_testing::{MockEventApi, Operation};
//!
//! #[tokio::test]
//! async fn test_join_is_single_flight() {
//!     let api = MockEventApi::new().with_event(sample_event(42));
//!     api.hold(Operation::Join);
//!
//!     // ... send Join twice through the store ...
//!
//!     assert_eq!(api.call_count(Operation::Join), 1);
//!     api.release(Operation::Join);
//! }
//! ```

use chrono::{DateTime, Utc};
use heritage_core::environment::Clock;

pub mod api_mocks;
pub mod reducer_test;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use heritage_testing::mocks::FixedClock;
    /// use heritage_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never happens.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers.
pub mod helpers {
    /// Install a test-friendly tracing subscriber.
    ///
    /// Safe to call from every test; only the first call installs. Honors
    /// `RUST_LOG`, defaulting to `debug` for the Heritage crates.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                "heritage_event_detail=debug,heritage_runtime=debug,heritage_client=debug",
            )
        });

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing strategies for catalog wire types.
pub mod properties {
    use chrono::{DateTime, TimeZone, Utc};
    use heritage_client::{Rating, RatingAuthor, RatingId, MAX_SCORE, MIN_SCORE};
    use proptest::prelude::*;

    /// A valid rating score.
    pub fn score() -> impl Strategy<Value = u8> {
        MIN_SCORE..=MAX_SCORE
    }

    /// A creation timestamp somewhere in 2024-2025.
    pub fn created_at() -> impl Strategy<Value = Option<DateTime<Utc>>> {
        proptest::option::of(1_704_067_200_i64..1_767_225_600_i64)
            .prop_map(|secs| secs.and_then(|s| Utc.timestamp_opt(s, 0).single()))
    }

    /// A single rating with the given id.
    pub fn rating(id: u64) -> impl Strategy<Value = Rating> {
        (
            "[a-z]{3,10}",
            proptest::option::of("[a-z]{4}\\.png"),
            score(),
            proptest::option::of("[A-Za-z !]{0,40}"),
            created_at(),
        )
            .prop_map(move |(username, avatar, score, comment, created_at)| Rating {
                id: RatingId(id),
                user: RatingAuthor { username, avatar },
                score,
                comment,
                created_at,
            })
    }

    /// Up to `max` ratings with distinct ids, in arbitrary server order.
    pub fn ratings(max: usize) -> impl Strategy<Value = Vec<Rating>> {
        proptest::collection::vec(any::<u8>(), 0..=max).prop_flat_map(|seeds| {
            seeds
                .iter()
                .enumerate()
                .map(|(i, seed)| rating(u64::from(*seed) * 1_000 + i as u64))
                .collect::<Vec<_>>()
        })
    }
}

pub use api_mocks::{ApiCall, MockEventApi, Operation};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
