use std::borrow::Cow;

use thiserror::Error;

/// Error raised by a host-supplied predicate or action.
pub type Fault = anyhow::Error;

/// Errors surfaced by [`Scheduler::advance`](crate::Scheduler::advance).
///
/// Whatever the variant, the scheduler that returned it has already discarded its suspended
/// frames and can be advanced again from a fresh activation.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("node `{node}` faulted: {source}")]
    Fault {
        node: Cow<'static, str>,
        #[source]
        source: Fault,
    },

    #[error("node `{node}` found a foreign frame record (expected {expected})")]
    FrameMismatch {
        node: Cow<'static, str>,
        expected: &'static str,
    },

    #[error("node `{node}` completed without a terminal status")]
    NonTerminal { node: Cow<'static, str> },

    #[error("scheduler advanced without a bound root node")]
    Unbound,
}

impl TickError {
    pub fn fault(node: &str, source: Fault) -> Self {
        TickError::Fault {
            node: Cow::Owned(node.to_owned()),
            source,
        }
    }

    /// Name of the node the error originated from, when there is one.
    pub fn node(&self) -> Option<&str> {
        match self {
            TickError::Fault { node, .. }
            | TickError::FrameMismatch { node, .. }
            | TickError::NonTerminal { node } => Some(node),
            TickError::Unbound => None,
        }
    }
}
