//! Shorthand constructors returning shared [`NodeRef`]s.
//!
//! ```ignore
//! use coro_bt::builder::*;
//!
//! let root = sequence(vec![
//!     condition("has_target", |s: &State| s.target.is_some()),
//!     wait(2),
//!     action("fire", |s: &mut State| s.shots += 1),
//! ]);
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use coro_core::{LanePolicy, NodeRef};

use crate::{
    Action, Aggregate, Condition, Filter, Interrupt, Inverter, Parallel, ParallelFilter, Repeat,
    Selector, Sequence, Succeeder, Wait,
};

pub fn condition<S: Send + 'static>(
    name: impl Into<Cow<'static, str>>,
    predicate: impl Fn(&S) -> bool + Send + Sync + 'static,
) -> NodeRef<S> {
    Arc::new(Condition::new(name, predicate))
}

pub fn action<S: Send + 'static>(
    name: impl Into<Cow<'static, str>>,
    effect: impl Fn(&mut S) + Send + Sync + 'static,
) -> NodeRef<S> {
    Arc::new(Action::new(name, effect))
}

pub fn wait<S: Send + 'static>(passes: u32) -> NodeRef<S> {
    Arc::new(Wait::new(passes))
}

pub fn sequence<S: Send + 'static>(children: Vec<NodeRef<S>>) -> NodeRef<S> {
    Arc::new(Sequence::new(children))
}

pub fn selector<S: Send + 'static>(children: Vec<NodeRef<S>>) -> NodeRef<S> {
    Arc::new(Selector::new(children))
}

pub fn filter<S: Send + 'static>(
    gate: impl Fn(&S) -> bool + Send + Sync + 'static,
    child: NodeRef<S>,
) -> NodeRef<S> {
    Arc::new(Filter::new(gate, child))
}

pub fn inverter<S: Send + 'static>(child: NodeRef<S>) -> NodeRef<S> {
    Arc::new(Inverter::new(child))
}

pub fn succeeder<S: Send + 'static>(child: NodeRef<S>) -> NodeRef<S> {
    Arc::new(Succeeder::new(child))
}

pub fn repeat<S: Send + 'static>(count: u32, child: NodeRef<S>) -> NodeRef<S> {
    Arc::new(Repeat::new(count, child))
}

pub fn parallel<S: Send + 'static>(children: Vec<NodeRef<S>>) -> NodeRef<S> {
    Arc::new(Parallel::new(children))
}

/// Parallel with an explicit lane policy and aggregation rule.
pub fn parallel_with<S: Send + 'static>(
    policy: LanePolicy,
    aggregate: Aggregate,
    children: Vec<NodeRef<S>>,
) -> NodeRef<S> {
    Arc::new(
        Parallel::new(children)
            .with_policy(policy)
            .with_aggregate(aggregate),
    )
}

pub fn parallel_filter<S: Send + 'static>(
    gate: impl Fn(&S) -> bool + Send + Sync + 'static,
    children: Vec<NodeRef<S>>,
) -> NodeRef<S> {
    Arc::new(ParallelFilter::new(gate, children))
}

pub fn interrupt<S: Send + 'static>(
    gate: impl Fn(&S) -> bool + Send + Sync + 'static,
    children: Vec<NodeRef<S>>,
) -> NodeRef<S> {
    Arc::new(Interrupt::new(gate, children))
}
