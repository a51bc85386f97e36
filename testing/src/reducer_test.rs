//! Given-When-Then testing for reducers
//!
//! Reducers are pure, so a test only needs a state, a list of actions and an
//! environment. Effects are inspected as descriptions, never executed.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use heritage_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Given a state, when some actions, then check the outcome.
///
/// Actions given with [`when_action`](Self::when_action) are applied in
/// order; effect assertions see the effects of the **last** action only,
/// state assertions see the final state.
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(EventDetailReducer::new())
///     .with_env(test_environment())
///     .given_state(ready_state())
///     .when_action(EventDetailAction::Join)
///     .when_action(EventDetailAction::Join)
///     .then_state(|state| assert!(state.in_flight.join))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// A test of `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment the actions are reduced with.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state.
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Queue another action.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the final state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, actions, or environment are not set,
    /// or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) -> S {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Default::default();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }

        state
    }
}

/// Helper assertions for effects
pub mod assertions {
    use heritage_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert how many futures the effects will run, counting nested ones
    ///
    /// # Panics
    ///
    /// Panics if the total doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_future_count<A>(effects: &[Effect<A>], expected: usize) {
        let total: usize = effects.iter().map(Effect::future_count).sum();
        assert_eq!(
            total, expected,
            "Expected {expected} future effects in total, but found {total}"
        );
    }

    /// Assert that effects contain a Parallel group
    ///
    /// # Panics
    ///
    /// Panics if no Parallel effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_parallel_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Parallel(_))),
            "Expected a Parallel effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_core::effect::Effect;
    use heritage_core::reducer::Reducer;
    use heritage_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct Toggle {
        on: bool,
        flips: u32,
    }

    #[derive(Clone, Debug)]
    enum ToggleAction {
        Flip,
        FlipLater,
        Flipped,
    }

    struct ToggleReducer;

    impl Reducer for ToggleReducer {
        type State = Toggle;
        type Action = ToggleAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                ToggleAction::Flip => {
                    state.on = !state.on;
                    state.flips += 1;
                    smallvec![Effect::None]
                }
                ToggleAction::FlipLater => smallvec![Effect::Parallel(vec![
                    Effect::Future(Box::pin(async { Some(ToggleAction::Flipped) })),
                    Effect::Future(Box::pin(async { None })),
                ])],
                ToggleAction::Flipped => smallvec![],
            }
        }
    }

    #[test]
    fn test_actions_apply_in_order() {
        let state = ReducerTest::new(ToggleReducer)
            .with_env(())
            .given_state(Toggle::default())
            .when_action(ToggleAction::Flip)
            .when_action(ToggleAction::Flip)
            .then_state(|state| {
                assert!(!state.on);
                assert_eq!(state.flips, 2);
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        assert_eq!(state.flips, 2);
    }

    #[test]
    fn test_effects_are_from_last_action() {
        ReducerTest::new(ToggleReducer)
            .with_env(())
            .given_state(Toggle::default())
            .when_action(ToggleAction::Flip)
            .when_action(ToggleAction::FlipLater)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_parallel_effect(effects);
                assertions::assert_future_count(effects, 2);
            })
            .run();
    }
}
