//! Single-lane continuation scheduler.
//!
//! One call to [`Scheduler::advance`] either starts a fresh activation of the root node or
//! resumes previously suspended frames, innermost first, stopping as soon as the resumed work
//! suspends again. An activation that spans several calls therefore unwinds in the same order a
//! synchronous call stack would, one visible step per external pass.

use std::borrow::Cow;
use std::mem;

use crate::coroutine::{Completion, Coroutine};
use crate::{NodeRef, Status, Step, TickContext, TickError};

enum Drive<S> {
    Suspended,
    /// Carries the envelope when its value still has to be consumed by the caller.
    Finished(Option<Box<Coroutine<S>>>),
}

pub struct Scheduler<S> {
    root: Option<NodeRef<S>>,
    /// Suspended frames; the innermost is on top.
    pending: Vec<Box<Coroutine<S>>>,
    /// Frames suspended during the current call, innermost first.
    staging: Vec<Box<Coroutine<S>>>,
    /// Completed frame whose value the next pending frame is waiting for.
    finished: Option<Box<Coroutine<S>>>,
    tick_count: u64,
    result: Status,
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self {
            root: None,
            pending: Vec::new(),
            staging: Vec::new(),
            finished: None,
            tick_count: 0,
            result: Status::Running,
        }
    }
}

impl<S> Scheduler<S> {
    pub fn root(&self) -> Option<&NodeRef<S>> {
        self.root.as_ref()
    }

    /// Number of activations that have fully unwound.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Result of the last completed activation, or `Running` while one is in flight.
    pub fn result(&self) -> Status {
        self.result
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the root node so the scheduler no longer keeps it alive. Suspended frames still hold
    /// their own nodes, so reset first. Advancing an unbound scheduler reports
    /// [`TickError::Unbound`].
    pub fn unbind(&mut self) {
        self.root = None;
    }
}

impl<S: Send + 'static> Scheduler<S> {
    pub fn new(root: NodeRef<S>) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    /// Replace the root node. The scheduler must be idle (reset it first otherwise).
    pub fn bind(&mut self, root: NodeRef<S>) {
        debug_assert!(self.is_idle(), "rebinding a scheduler with suspended frames");
        self.root = Some(root);
    }

    /// Names of the suspended nodes, root first.
    pub fn active_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.pending.iter().map(|env| env.name())
    }

    pub fn advance(&mut self, cx: &mut TickContext<'_, S>) -> Result<(), TickError> {
        let outcome = if self.pending.is_empty() {
            self.start(cx)
        } else {
            self.resume(cx)
        };

        if let Err(err) = outcome {
            tracing::warn!(lane = %cx.lane(), error = %err, "tick faulted; discarding suspended frames");
            self.reset(cx);
            return Err(err);
        }

        // Staging holds the innermost frame first; it has to end up on top.
        while let Some(env) = self.staging.pop() {
            self.pending.push(env);
        }

        if self.pending.is_empty() {
            let value = self
                .finished
                .take()
                .and_then(|env| env.consume(cx.pool()));
            self.tick_count += 1;
            self.result = value.unwrap_or(Status::Failure);
            tracing::debug!(
                lane = %cx.lane(),
                tick = self.tick_count,
                result = ?self.result,
                "activation complete"
            );
        }

        Ok(())
    }

    /// Terminate every suspended frame (innermost first) and drop all queued work.
    /// `tick_count` is left untouched.
    pub fn reset(&mut self, cx: &mut TickContext<'_, S>) {
        let frames = self.pending.len() + self.staging.len();

        if let Some(env) = self.finished.take() {
            env.release(cx.pool());
        }

        let mut staged = mem::take(&mut self.staging);
        for mut env in staged.drain(..) {
            env.terminate(cx);
            env.release(cx.pool());
        }
        self.staging = staged;

        while let Some(mut env) = self.pending.pop() {
            env.terminate(cx);
            env.release(cx.pool());
        }

        self.result = Status::Running;
        if frames > 0 {
            tracing::debug!(lane = %cx.lane(), frames, "scheduler reset");
        }
    }

    fn start(&mut self, cx: &mut TickContext<'_, S>) -> Result<(), TickError> {
        let root = self.root.clone().ok_or(TickError::Unbound)?;
        self.result = Status::Running;
        let env = Self::enter(root, Completion::Value, cx);
        if let Drive::Finished(done) = self.drive(env, cx)? {
            self.finished = done;
        }
        Ok(())
    }

    fn resume(&mut self, cx: &mut TickContext<'_, S>) -> Result<(), TickError> {
        while let Some(mut env) = self.pending.pop() {
            let delivered = self
                .finished
                .take()
                .and_then(|child| child.consume(cx.pool()));
            env.frame_mut().deliver(delivered);

            tracing::trace!(lane = %cx.lane(), node = env.name(), "resuming");
            if let Drive::Finished(done) = self.drive(env, cx)? {
                self.finished = done;
            }

            if !self.staging.is_empty() {
                break;
            }
        }
        Ok(())
    }

    fn enter(
        node: NodeRef<S>,
        completion: Completion,
        cx: &mut TickContext<'_, S>,
    ) -> Box<Coroutine<S>> {
        cx.activated(&*node);
        Coroutine::create(node, completion, cx.pool())
    }

    /// Run one frame synchronously until it suspends or completes, executing child calls
    /// depth-first along the way.
    fn drive(
        &mut self,
        mut env: Box<Coroutine<S>>,
        cx: &mut TickContext<'_, S>,
    ) -> Result<Drive<S>, TickError> {
        loop {
            let step = match env.tick(cx) {
                Ok(step) => step,
                Err(err) => {
                    Self::abandon(env, cx);
                    return Err(err);
                }
            };

            let (child, completion) = match step {
                Step::Yield => {
                    self.staging.push(env);
                    return Ok(Drive::Suspended);
                }
                Step::Done(status) => {
                    if !status.is_terminal() {
                        let err = TickError::NonTerminal {
                            node: Cow::Owned(env.name().to_owned()),
                        };
                        Self::abandon(env, cx);
                        return Err(err);
                    }
                    env.deactivate(cx);
                    env.complete(status);
                    return Ok(match env.completion() {
                        Completion::Value => Drive::Finished(Some(env)),
                        Completion::Void => {
                            env.release(cx.pool());
                            Drive::Finished(None)
                        }
                    });
                }
                Step::Call(child) => (child, Completion::Value),
                Step::Await(child) => (child, Completion::Void),
            };

            let child_env = Self::enter(child, completion, cx);
            match self.drive(child_env, cx) {
                Ok(Drive::Finished(done)) => {
                    let value = done.and_then(|child| child.consume(cx.pool()));
                    env.frame_mut().deliver(value);
                }
                Ok(Drive::Suspended) => {
                    self.staging.push(env);
                    return Ok(Drive::Suspended);
                }
                Err(err) => {
                    Self::abandon(env, cx);
                    return Err(err);
                }
            }
        }
    }

    fn abandon(mut env: Box<Coroutine<S>>, cx: &mut TickContext<'_, S>) {
        env.terminate(cx);
        env.release(cx.pool());
    }
}
