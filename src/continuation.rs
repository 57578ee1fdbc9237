//! The intercepted call an instrumentation point wraps.
//!
//! Plugins hand plugin services a typed closure (`FnOnce() -> Result<T, E>`
//! or `FnOnce() -> T`). Engines sit behind a trait object, so they see it
//! type-erased as a [`Continuation`]: something they may [`proceed`] at most
//! once and whose [`Outcome`] they may record. The typed result never leaves
//! the caller's stack frame.
//!
//! [`proceed`]: Continuation::proceed

use std::fmt;

/// What an engine observes of a finished continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The wrapped call returned normally.
    Completed,
    /// The wrapped call returned an error, rendered with `Display`.
    Failed(String),
}

impl Outcome {
    /// Returns `true` if the wrapped call completed normally.
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    /// Returns the failure message, if the wrapped call failed.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Outcome::Failed(message) => Some(message),
            Outcome::Completed => None,
        }
    }

    /// Classifies a typed result.
    pub fn of_result<T, E: fmt::Display>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Completed,
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// A type-erased, single-use handle on the wrapped call.
///
/// [`proceed`](Continuation::proceed) consumes the handle, so an engine can
/// run the wrapped call at most once. If an engine returns without
/// proceeding, plugin services run the call themselves.
pub struct Continuation<'a> {
    work: &'a mut dyn FnMut() -> Outcome,
}

impl<'a> Continuation<'a> {
    /// Wraps an erased call.
    ///
    /// Plugin services build continuations internally; this constructor
    /// exists so engine implementations can be exercised in isolation.
    pub fn new(work: &'a mut dyn FnMut() -> Outcome) -> Self {
        Self { work }
    }

    /// Runs the wrapped call and reports how it finished.
    pub fn proceed(self) -> Outcome {
        (self.work)()
    }
}

impl fmt::Debug for Continuation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation").finish_non_exhaustive()
    }
}

/// Payload raised when an engine catches a panic from
/// [`Continuation::proceed`] and returns normally.
pub const CAUGHT_CONTINUATION_PANIC: &str =
    "tracing engine caught a panic from the intercepted call; engines must let it unwind";

/// Erases `work` into a [`Continuation`], lets `engine_call` drive it, and
/// returns the typed result.
///
/// `work` runs exactly once: through the continuation if the engine
/// proceeds, directly otherwise. If `work` panics and the engine swallows the
/// unwind, the caller's thread unwinds with [`CAUGHT_CONTINUATION_PANIC`].
pub(crate) fn run_erased<R, W, H>(work: W, classify: fn(&R) -> Outcome, engine_call: H) -> R
where
    W: FnOnce() -> R,
    H: FnOnce(Continuation<'_>),
{
    let mut work = Some(work);
    let mut result = None;
    {
        let mut erased = || match work.take() {
            Some(work) => {
                let value = work();
                let outcome = classify(&value);
                result = Some(value);
                outcome
            },
            None => Outcome::Completed,
        };
        engine_call(Continuation::new(&mut erased));
    }

    match (result, work) {
        (Some(value), _) => value,
        (None, Some(work)) => {
            tracing::warn!("engine returned without proceeding, running intercepted call directly");
            work()
        },
        // the call unwound and the engine caught it; keep unwinding
        (None, None) => std::panic::resume_unwind(Box::new(CAUGHT_CONTINUATION_PANIC)),
    }
}

pub(crate) fn completed<R>(_: &R) -> Outcome {
    Outcome::Completed
}
