//! Declarative macros for ergonomic effect construction
//!
//! Remote calls in the reconciler all share one shape: run an async block,
//! wrap the outcome in a result action. These macros remove the boxing noise.

/// Create an `Effect::Future` from an async block
///
/// The block evaluates to `Option<Action>`; `Some` is fed back into the reducer.
///
/// # Example
///
/// ```rust,ignore
/// use heritage_core::async_effect;
///
/// async_effect! {
///     let result = api.fetch_average(event_id).await;
///     Some(PageAction::AverageRefreshed { generation, result })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that always feeds back exactly one action
///
/// Shorthand for the common "call, then report" shape.
///
/// # Example
///
/// ```rust,ignore
/// use heritage_core::feedback;
///
/// feedback! {
///     PageAction::EventRefreshed { generation, result: api.fetch_event(id).await }
/// }
/// ```
#[macro_export]
macro_rules! feedback {
    ($action:expr) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { ::std::option::Option::Some($action) })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use heritage_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(4),
///     action: PageAction::DismissNotice
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        AsyncResult { value: i32 },
        NoticeExpired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::AsyncResult { value: 42 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_feedback_macro_yields_action() {
        let value = 7;
        let effect = feedback!(TestAction::AsyncResult { value });

        let Effect::Future(fut) = effect else {
            unreachable!("feedback! always builds a future effect");
        };
        assert_eq!(
            tokio_test::block_on(fut),
            Some(TestAction::AsyncResult { value: 7 })
        );
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(4),
            action: TestAction::NoticeExpired
        };

        assert!(matches!(effect, Effect::Delay { .. }));
    }
}
