//! Behaviour tree combinators and tree host built on `coro-core`.
//!
//! Every node here is an immutable template; per-activation state lives in the frames and
//! pooled records owned by the schedulers that execute them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod builder;
pub mod callable;
pub mod decorator;
pub mod nodes;
pub mod parallel;
pub mod tree;

pub use callable::{Effect, Predicate};
pub use decorator::{Filter, Inverter, Repeat, Succeeder};
pub use nodes::{Action, Condition, Selector, Sequence, Wait};
pub use parallel::{Aggregate, Interrupt, Parallel, ParallelFilter};
pub use tree::{BehaviourTree, TreeConfig};

pub use coro_core::{
    ActiveStacks, Coroutine, Fault, Frame, LaneId, LanePolicy, Node, NodeObserver, NodeRef, Pool,
    Recycle, Status, Step, TickContext, TickError,
};
