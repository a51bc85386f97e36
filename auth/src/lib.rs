//! # Heritage Session Identity
//!
//! Who is looking at the page, and with what credentials.
//!
//! The event-detail reconciler never reaches for a global "current user".
//! It is handed a [`SessionProvider`] through its environment and asks it,
//! at well-defined points, whether an identity is present.
//!
//! ## Example
//!
//! ```
//! use heritage_auth::{Identity, Role, SessionProvider, SharedSession, UserId};
//!
//! let session = SharedSession::anonymous();
//! assert!(session.identity().is_none());
//!
//! session.sign_in(Identity::new(UserId(7), Role::Visitor), "token-7");
//! assert_eq!(session.identity().map(|i| i.id), Some(UserId(7)));
//!
//! session.sign_out();
//! assert!(!session.is_authenticated());
//! ```

pub mod error;
pub mod providers;
pub mod session;
pub mod state;

pub use error::{AuthError, Result};
pub use providers::SessionProvider;
pub use session::{Anonymous, SharedSession};
pub use state::{Identity, Role, Session, UserId};
