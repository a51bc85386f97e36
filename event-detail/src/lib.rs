//! # Heritage Event Detail
//!
//! Participation and rating reconciliation for one event page.
//!
//! The page is a reducer ([`EventDetailReducer`]) driven by a
//! [`heritage_runtime::Store`]. On mount it loads the event, its ratings,
//! the average and (for a signed-in visitor) their participation status in
//! one all-settled step; join, leave and rate are guarded per operation and
//! followed by refreshes of the aggregates they affect. Results carry the
//! generation (and user) they were issued for, so answers for a previous
//! event, page or identity are dropped.
//!
//! ## Example
//!
//! ```ignore
//! let env = EventDetailEnvironment::new(Arc::new(api), Arc::new(session));
//! let page = EventDetailReconciler::new(env);
//!
//! page.mount(EventId(42)).await?;
//! page.wait_idle(Duration::from_secs(5)).await?;
//!
//! let view = page.view().await;
//! println!("{} ({} reviews)", view.average_rating, view.review_count);
//! ```

pub mod config;
pub mod directory;
pub mod environment;
pub mod reconciler;
pub mod reducer;
pub mod types;
pub mod view;

pub use config::{AppConfig, ConfigError, SessionConfig};
pub use directory::{DirectoryCache, RegionDirectory};
pub use environment::EventDetailEnvironment;
pub use reconciler::{EventDetailReconciler, EventDetailStore};
pub use reducer::EventDetailReducer;
pub use types::{
    Draft, EventDetailAction, EventDetailState, Generation, InFlight, Notice, PageLoad,
    Participation, Phase, ProvinceLabel, UserRating,
};
pub use view::{EventDetailView, RatingSummary, ReviewRow};
