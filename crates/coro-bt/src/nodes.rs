use std::borrow::Cow;

use coro_core::{Fault, Frame, Node, NodeRef, Status, Step, TickContext, TickError};

use crate::callable::{self, Effect, Predicate};

/// Leaf evaluating a predicate against the external state. Never suspends.
pub struct Condition<S> {
    name: Cow<'static, str>,
    predicate: Predicate<S>,
}

impl<S> Condition<S> {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        predicate: impl Fn(&S) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: callable::predicate(predicate),
        }
    }

    /// Condition whose predicate may fault; a fault aborts the pass.
    pub fn try_new(
        name: impl Into<Cow<'static, str>>,
        predicate: impl Fn(&S) -> Result<bool, Fault> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: callable::try_predicate(predicate),
        }
    }
}

impl<S: Send + 'static> Node<S> for Condition<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&self, _frame: &mut Frame, cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        let ok = callable::check(&self.predicate, &self.name, cx.state())?;
        Ok(Step::Done(Status::from(ok)))
    }
}

/// Leaf performing a side effect on the external state. Never suspends.
pub struct Action<S> {
    name: Cow<'static, str>,
    effect: Effect<S>,
}

impl<S> Action<S> {
    /// Action that always succeeds.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        effect: impl Fn(&mut S) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            effect: callable::effect(effect),
        }
    }

    /// Action reporting its own success (`Ok(true)`), failure (`Ok(false)`) or fault.
    pub fn try_new(
        name: impl Into<Cow<'static, str>>,
        effect: impl Fn(&mut S) -> Result<bool, Fault> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            effect: callable::try_effect(effect),
        }
    }
}

impl<S: Send + 'static> Node<S> for Action<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&self, _frame: &mut Frame, cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        let ok = callable::apply(&self.effect, &self.name, cx.state_mut())?;
        Ok(Step::Done(Status::from(ok)))
    }
}

/// Suspends for a fixed number of passes, then succeeds.
pub struct Wait {
    name: Cow<'static, str>,
    passes: u32,
}

impl Wait {
    pub fn new(passes: u32) -> Self {
        Self {
            name: Cow::Borrowed("wait"),
            passes,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Wait {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        // The resume point doubles as the number of suspensions so far.
        let waited = frame.point();
        if waited < self.passes {
            return Ok(frame.yield_at(waited + 1));
        }
        Ok(Step::Done(Status::Success))
    }
}

/// Runs children in order until one fails.
///
/// A child that suspends keeps the sequence parked on it: the next pass resumes inside that
/// child rather than re-evaluating earlier ones. Empty sequences succeed.
pub struct Sequence<S> {
    name: Cow<'static, str>,
    children: Vec<NodeRef<S>>,
}

impl<S> Sequence<S> {
    pub fn new(children: Vec<NodeRef<S>>) -> Self {
        Self {
            name: Cow::Borrowed("sequence"),
            children,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Sequence<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[NodeRef<S>] {
        &self.children
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        // Resume point = index of the child being executed.
        let mut index = frame.point() as usize;
        if let Some(status) = frame.take_awaited() {
            if status.is_failure() {
                return Ok(Step::Done(Status::Failure));
            }
            index += 1;
        }

        match self.children.get(index) {
            Some(child) => Ok(frame.call_at(index as u32, child)),
            None => Ok(Step::Done(Status::Success)),
        }
    }
}

/// Runs children in order until one succeeds. Empty selectors fail.
pub struct Selector<S> {
    name: Cow<'static, str>,
    children: Vec<NodeRef<S>>,
}

impl<S> Selector<S> {
    pub fn new(children: Vec<NodeRef<S>>) -> Self {
        Self {
            name: Cow::Borrowed("selector"),
            children,
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Send + 'static> Node<S> for Selector<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[NodeRef<S>] {
        &self.children
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        let mut index = frame.point() as usize;
        if let Some(status) = frame.take_awaited() {
            if status.is_success() {
                return Ok(Step::Done(Status::Success));
            }
            index += 1;
        }

        match self.children.get(index) {
            Some(child) => Ok(frame.call_at(index as u32, child)),
            None => Ok(Step::Done(Status::Failure)),
        }
    }
}
