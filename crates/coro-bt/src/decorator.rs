//! Single-child decorators.

use std::borrow::Cow;
use std::slice;

use coro_core::{Fault, Frame, Node, NodeRef, Pool, Recycle, Status, Step, TickContext, TickError};

use crate::callable::{self, Predicate};

const CALL: u32 = 1;

/// Guards a child with a predicate checked once, on entry.
///
/// A false gate fails without suspending. Once the child has been entered the gate is not
/// consulted again; use [`ParallelFilter`](crate::ParallelFilter) for continuous gating.
pub struct Filter<S> {
    name: Cow<'static, str>,
    gate: Predicate<S>,
    child: NodeRef<S>,
}

impl<S> Filter<S> {
    pub fn new(gate: impl Fn(&S) -> bool + Send + Sync + 'static, child: NodeRef<S>) -> Self {
        Self {
            name: Cow::Borrowed("filter"),
            gate: callable::predicate(gate),
            child,
        }
    }

    pub fn try_new(
        gate: impl Fn(&S) -> Result<bool, Fault> + Send + Sync + 'static,
        child: NodeRef<S>,
    ) -> Self {
        Self {
            name: Cow::Borrowed("filter"),
            gate: callable::try_predicate(gate),
            child,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Filter<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[NodeRef<S>] {
        slice::from_ref(&self.child)
    }

    fn tick(&self, frame: &mut Frame, cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        match frame.point() {
            0 => {
                if !callable::check(&self.gate, &self.name, cx.state())? {
                    return Ok(Step::Done(Status::Failure));
                }
                Ok(frame.call_at(CALL, &self.child))
            }
            _ => Ok(Step::Done(frame.take_awaited().unwrap_or(Status::Failure))),
        }
    }
}

/// Swaps Success and Failure of its child.
pub struct Inverter<S> {
    name: Cow<'static, str>,
    child: NodeRef<S>,
}

impl<S> Inverter<S> {
    pub fn new(child: NodeRef<S>) -> Self {
        Self {
            name: Cow::Borrowed("inverter"),
            child,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Inverter<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[NodeRef<S>] {
        slice::from_ref(&self.child)
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        match frame.point() {
            0 => Ok(frame.call_at(CALL, &self.child)),
            _ => {
                let status = frame.take_awaited().unwrap_or(Status::Failure);
                Ok(Step::Done(status.invert()))
            }
        }
    }
}

/// Runs its child for effect only and always succeeds.
///
/// The child is executed through a value-less envelope, so its status is never materialised.
pub struct Succeeder<S> {
    name: Cow<'static, str>,
    child: NodeRef<S>,
}

impl<S> Succeeder<S> {
    pub fn new(child: NodeRef<S>) -> Self {
        Self {
            name: Cow::Borrowed("succeeder"),
            child,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Succeeder<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[NodeRef<S>] {
        slice::from_ref(&self.child)
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        match frame.point() {
            0 => Ok(frame.await_at(CALL, &self.child)),
            _ => Ok(Step::Done(Status::Success)),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RepeatRecord {
    completed: u32,
}

impl Recycle for RepeatRecord {
    fn recycle(&mut self) {
        self.completed = 0;
    }
}

/// Runs its child up to `count` times, failing as soon as one activation fails.
pub struct Repeat<S> {
    name: Cow<'static, str>,
    count: u32,
    child: NodeRef<S>,
}

impl<S> Repeat<S> {
    pub fn new(count: u32, child: NodeRef<S>) -> Self {
        Self {
            name: Cow::Borrowed("repeat"),
            count,
            child,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Repeat<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[NodeRef<S>] {
        slice::from_ref(&self.child)
    }

    fn record(&self, pool: &Pool) -> Option<Box<dyn Recycle>> {
        let record: Box<dyn Recycle> = pool.take::<RepeatRecord>();
        Some(record)
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        let awaited = frame.take_awaited();
        let record = frame.record::<RepeatRecord>(&self.name)?;

        if let Some(status) = awaited {
            if status.is_failure() {
                return Ok(Step::Done(Status::Failure));
            }
            record.completed += 1;
        }

        if record.completed >= self.count {
            return Ok(Step::Done(Status::Success));
        }
        Ok(frame.call_at(CALL, &self.child))
    }
}
