//! # Heritage Core
//!
//! Core traits and types behind the event-detail reconciler.
//!
//! The reconciler is written as a reducer: a pure function
//! `(State, Action, Environment) → Effects`. Remote calls never happen inside
//! the reducer; it returns [`effect::Effect`] descriptions which the runtime
//! executes, feeding any resulting action back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: everything one page visit knows (event, participation, aggregates)
//! - **Action**: user commands and the results of remote calls
//! - **Reducer**: the state machine, `(State, Action, Environment) → Effects`
//! - **Effect**: side effect descriptions (not execution)
//! - **Environment**: injected dependencies (API client, session, clock)
//!
//! ## Example
//!
//! ```ignore
//! use heritage_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for PageReducer {
//!     type State = PageState;
//!     type Action = PageAction;
//!     type Environment = PageEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut PageState,
//!         action: PageAction,
//!         env: &PageEnvironment,
//!     ) -> SmallVec<[Effect<PageAction>; 4]> {
//!         match action {
//!             PageAction::Refresh => {
//!                 let api = env.api.clone();
//!                 smallvec![Effect::Future(Box::pin(async move {
//!                     Some(PageAction::Refreshed(api.fetch().await))
//!                 }))]
//!             }
//!             PageAction::Refreshed(result) => {
//!                 state.apply(result);
//!                 SmallVec::new()
//!             }
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Declarative macros for building effects
pub mod effect_macros;

/// The state machine trait.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Decides how each action changes the state and which remote work follows.
    pub trait Reducer {
        /// What the reducer owns
        type State;

        /// Commands and results
        type Action;

        /// Injected services
        type Environment;

        /// Apply `action` to `state` and describe the work it triggers.
        ///
        /// Must not perform I/O itself.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of work for the runtime.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Work a reducer asks for; inert until the store runs it.
    pub enum Effect<Action> {
        /// Nothing
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another, each waiting for the previous
        Sequential(Vec<Effect<Action>>),

        /// Delayed action
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Async work whose `Some` output is reduced next
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Run `effects` concurrently.
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Run `effects` in order.
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Number of `Future` effects in this tree
        ///
        /// Reducer tests use this to count how many remote calls an action issues.
        #[must_use]
        pub fn future_count(&self) -> usize {
            match self {
                Effect::None | Effect::Delay { .. } => 0,
                Effect::Future(_) => 1,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().map(Effect::future_count).sum()
                },
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// External dependencies are abstracted behind traits and injected via the
/// Environment parameter, so the reducer runs unchanged against fakes.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use heritage_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[derive(Debug, Clone)]
    enum TestAction {
        Done,
    }

    #[test]
    fn test_future_count_walks_nested_effects() {
        let effect: Effect<TestAction> = Effect::merge(vec![
            Effect::Future(Box::pin(async { Some(TestAction::Done) })),
            Effect::chain(vec![
                Effect::None,
                Effect::Future(Box::pin(async { None })),
            ]),
        ]);

        assert_eq!(effect.future_count(), 2);
    }

    #[test]
    fn test_debug_hides_future_body() {
        let effect: Effect<TestAction> = Effect::Future(Box::pin(async { None }));
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }
}
