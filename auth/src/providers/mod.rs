//! Session provider trait.
//!
//! The reconciler depends on this trait, never on a concrete session store:
//!
//! - **Testing**: [`crate::SharedSession`] with a fake identity
//! - **Production**: whatever wrapper the shell keeps its token in

use crate::state::Identity;

/// Source of the current authenticated identity.
///
/// `None` means unauthenticated. Implementations must be cheap to call; the
/// reconciler consults the provider synchronously on every gated operation.
pub trait SessionProvider: Send + Sync {
    /// The signed-in identity, if any.
    fn identity(&self) -> Option<Identity>;

    /// Bearer token for the `Authorization` header, if signed in.
    fn bearer_token(&self) -> Option<String>;

    /// Whether an identity is present.
    fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}
