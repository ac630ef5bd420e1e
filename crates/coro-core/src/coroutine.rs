//! Suspension envelopes and their captured-state records.

use std::any::type_name;
use std::borrow::Cow;

use crate::pool::{AsAny, Pool, Recycle};
use crate::{NodeRef, Status, Step, TickContext, TickError};

/// Captured state of one call frame: where to resume, the node's typed locals (if it keeps
/// any), and the terminal value of the child call it was awaiting.
#[derive(Default)]
pub struct Frame {
    point: u32,
    record: Option<Box<dyn Recycle>>,
    awaited: Option<Status>,
}

impl Frame {
    /// Resume point. `0` on entry.
    #[inline]
    pub fn point(&self) -> u32 {
        self.point
    }

    #[inline]
    pub fn set_point(&mut self, point: u32) {
        self.point = point;
    }

    /// Suspend this frame; the next resume re-enters at `point`.
    #[inline]
    pub fn yield_at<S>(&mut self, point: u32) -> Step<S> {
        self.point = point;
        Step::Yield
    }

    /// Call `child` and await its status; the frame re-enters at `point` once it is terminal.
    #[inline]
    pub fn call_at<S>(&mut self, point: u32, child: &NodeRef<S>) -> Step<S> {
        self.point = point;
        Step::Call(child.clone())
    }

    /// Call `child` without awaiting its value (value-less envelope).
    #[inline]
    pub fn await_at<S>(&mut self, point: u32, child: &NodeRef<S>) -> Step<S> {
        self.point = point;
        Step::Await(child.clone())
    }

    /// Terminal status of the child call that just finished, if any. Reads it exactly once.
    #[inline]
    pub fn take_awaited(&mut self) -> Option<Status> {
        self.awaited.take()
    }

    pub fn has_record(&self) -> bool {
        self.record.is_some()
    }

    /// Typed access to the node's locals record.
    pub fn record<T: Recycle>(&mut self, node: &str) -> Result<&mut T, TickError> {
        self.record
            .as_mut()
            .and_then(|r| AsAny::as_any_mut(&mut **r).downcast_mut::<T>())
            .ok_or_else(|| TickError::FrameMismatch {
                node: Cow::Owned(node.to_owned()),
                expected: type_name::<T>(),
            })
    }

    pub(crate) fn deliver(&mut self, value: Option<Status>) {
        self.awaited = value;
    }
}

/// Whether the awaiting caller reads the envelope's terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    /// Released when the caller consumes the value.
    #[default]
    Value,
    /// Released as soon as the computation completes or faults.
    Void,
}

/// Suspension envelope for one outstanding `Execute` of a node.
pub struct Coroutine<S> {
    node: Option<NodeRef<S>>,
    frame: Frame,
    outcome: Option<Status>,
    completion: Completion,
}

impl<S> Default for Coroutine<S> {
    fn default() -> Self {
        Self {
            node: None,
            frame: Frame::default(),
            outcome: None,
            completion: Completion::Value,
        }
    }
}

impl<S: Send + 'static> Recycle for Coroutine<S> {
    fn recycle(&mut self) {
        self.node = None;
        self.frame.point = 0;
        self.frame.awaited = None;
        self.frame.record = None;
        self.outcome = None;
        self.completion = Completion::Value;
    }
}

impl<S: Send + 'static> Coroutine<S> {
    /// Obtain an envelope (and the node's locals record) from the pool.
    pub fn create(node: NodeRef<S>, completion: Completion, pool: &Pool) -> Box<Self> {
        let mut env = pool.take::<Self>();
        env.frame.record = node.record(pool);
        env.node = Some(node);
        env.completion = completion;
        env
    }

    pub fn node(&self) -> Option<&NodeRef<S>> {
        self.node.as_ref()
    }

    pub fn name(&self) -> &str {
        self.node.as_ref().map(|n| n.name()).unwrap_or("<unbound>")
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn complete(&mut self, status: Status) {
        self.outcome = Some(status);
    }

    /// Read the terminal value and hand the envelope back to the pool.
    pub fn consume(mut self: Box<Self>, pool: &Pool) -> Option<Status> {
        let value = self.outcome.take();
        self.release(pool);
        value
    }

    /// Hand the envelope and its record back to the pool without reading the value.
    pub fn release(mut self: Box<Self>, pool: &Pool) {
        if let Some(record) = self.frame.record.take() {
            pool.give_boxed(record);
        }
        pool.give(self);
    }

    pub(crate) fn tick(&mut self, cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        match self.node.as_ref() {
            Some(node) => node.tick(&mut self.frame, cx),
            None => Err(TickError::Unbound),
        }
    }

    pub(crate) fn deactivate(&self, cx: &mut TickContext<'_, S>) {
        if let Some(node) = self.node.as_ref() {
            cx.deactivated(&**node);
        }
    }

    /// Run the node's termination hook and report it inactive.
    pub(crate) fn terminate(&mut self, cx: &mut TickContext<'_, S>) {
        if let Some(node) = self.node.as_ref() {
            node.terminate(&mut self.frame, cx);
            cx.deactivated(&**node);
        }
    }
}
