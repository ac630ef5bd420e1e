//! Inspection tooling for coro-core schedulers.
//!
//! Everything here plugs into a tree through [`NodeObserver`](coro_core::NodeObserver); the
//! engine never depends on it. Renderers and debugger front-ends should live in their own crates.
//! Per-lane active stacks live in coro-core as [`ActiveStacks`] because tree hosts keep them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use coro_core::ActiveStacks;
pub use trace::{TraceEvent, TraceLog, TraceObserver, TraceSink, NODE_ACTIVE, NODE_INACTIVE};
