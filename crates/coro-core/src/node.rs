use std::sync::Arc;

use crate::{Frame, Pool, Recycle, TickContext, TickError};

/// Shared handle to an immutable node template.
pub type NodeRef<S> = Arc<dyn Node<S>>;

/// What a node asks the scheduler to do after one `tick`.
pub enum Step<S> {
    /// Suspension point: park this frame until the next pass.
    Yield,
    /// Execute a child and re-enter with its terminal status.
    Call(NodeRef<S>),
    /// Execute a child and re-enter once it is done, discarding its status.
    Await(NodeRef<S>),
    /// Terminal status of this activation. Must not be `Running`.
    Done(crate::Status),
}

/// A suspendable unit of decision logic.
///
/// Nodes are templates: the same instance can be executed by many schedulers at once, so all
/// execution state must live in the [`Frame`] the scheduler passes in. A node that keeps locals
/// across suspension points declares a record type through [`Node::record`] and reads it back
/// with [`Frame::record`].
pub trait Node<S>: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn children(&self) -> &[NodeRef<S>] {
        &[]
    }

    /// Locals record for a fresh activation, taken from `pool`.
    fn record(&self, _pool: &Pool) -> Option<Box<dyn Recycle>> {
        None
    }

    /// Advance this activation from `frame.point()` to its next [`Step`].
    fn tick(&self, frame: &mut Frame, cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError>;

    /// Forced termination of an active (suspended) activation. Must not suspend.
    fn terminate(&self, _frame: &mut Frame, _cx: &mut TickContext<'_, S>) {}
}
