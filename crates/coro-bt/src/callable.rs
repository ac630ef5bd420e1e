//! Host-supplied callables consumed by leaf and gating nodes.
//!
//! How these are produced (hand-written closures, compiled expressions, an interpreter) is up to
//! the host; the engine only needs something it can call against the external state.

use coro_core::{Fault, TickError};

/// Read-only check against the external state.
pub type Predicate<S> = Box<dyn Fn(&S) -> Result<bool, Fault> + Send + Sync>;

/// Side-effecting step against the external state; `Ok(false)` reports failure.
pub type Effect<S> = Box<dyn Fn(&mut S) -> Result<bool, Fault> + Send + Sync>;

pub fn predicate<S, F>(f: F) -> Predicate<S>
where
    F: Fn(&S) -> bool + Send + Sync + 'static,
{
    Box::new(move |state| Ok(f(state)))
}

pub fn try_predicate<S, F>(f: F) -> Predicate<S>
where
    F: Fn(&S) -> Result<bool, Fault> + Send + Sync + 'static,
{
    Box::new(f)
}

pub fn effect<S, F>(f: F) -> Effect<S>
where
    F: Fn(&mut S) + Send + Sync + 'static,
{
    Box::new(move |state| {
        f(state);
        Ok(true)
    })
}

pub fn try_effect<S, F>(f: F) -> Effect<S>
where
    F: Fn(&mut S) -> Result<bool, Fault> + Send + Sync + 'static,
{
    Box::new(f)
}

pub(crate) fn check<S>(predicate: &Predicate<S>, node: &str, state: &S) -> Result<bool, TickError> {
    predicate(state).map_err(|source| TickError::fault(node, source))
}

pub(crate) fn apply<S>(effect: &Effect<S>, node: &str, state: &mut S) -> Result<bool, TickError> {
    effect(state).map_err(|source| TickError::fault(node, source))
}
