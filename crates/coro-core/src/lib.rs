//! Cooperative, allocation-stable execution substrate for tick-driven decision logic.
//!
//! Suspendable computations are explicit state machines: a [`Node`] dispatches on the resume
//! point stored in its [`Frame`] and reports a [`Step`] back to the [`Scheduler`], which owns the
//! suspended call frames between external passes. [`Lane`]s wrap a scheduler with a completion
//! policy so composites can interleave several branches within one pass.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod context;
pub mod coroutine;
pub mod error;
pub mod lane;
pub mod node;
pub mod pool;
pub mod scheduler;
pub mod stacks;
pub mod status;

pub use context::{NodeObserver, TickContext};
pub use coroutine::{Completion, Coroutine, Frame};
pub use error::{Fault, TickError};
pub use lane::{Lane, LaneId, LanePolicy};
pub use node::{Node, NodeRef, Step};
pub use pool::{Pool, PoolStats, Recycle};
pub use scheduler::Scheduler;
pub use stacks::ActiveStacks;
pub use status::Status;
