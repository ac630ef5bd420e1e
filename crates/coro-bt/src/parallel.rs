//! Concurrent composites.
//!
//! Each child runs on its own [`Lane`], so every branch gets exactly one resumption attempt per
//! external pass no matter how deeply it is suspended or how many other branches are in flight.
//! Lanes live in a pooled record on the composite's frame and are re-armed, not rebuilt, on
//! every activation.

use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use coro_core::{
    Fault, Frame, Lane, LanePolicy, Node, NodeRef, Pool, Recycle, Status, Step, TickContext,
    TickError,
};

use crate::callable::{self, Predicate};

const RESUME: u32 = 1;

/// How the terminal results of a composite's lanes fold into its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Aggregate {
    /// Success if at least one lane succeeded.
    #[default]
    Any,
    /// Success only if every lane succeeded.
    All,
}

impl Aggregate {
    pub fn fold(self, results: impl IntoIterator<Item = Status>) -> Status {
        let mut results = results.into_iter();
        let ok = match self {
            Aggregate::Any => results.any(Status::is_success),
            Aggregate::All => results.all(Status::is_success),
        };
        Status::from(ok)
    }
}

pub(crate) struct ConcurrentRecord<S> {
    lanes: Vec<Lane<S>>,
    active: usize,
}

impl<S> Default for ConcurrentRecord<S> {
    fn default() -> Self {
        Self {
            lanes: Vec::new(),
            active: 0,
        }
    }
}

impl<S: Send + 'static> Recycle for ConcurrentRecord<S> {
    fn recycle(&mut self) {
        // Disarm has already reset the lanes. They stay for the next activation, but must not
        // keep this tree's nodes alive while shelved in a shared pool.
        for lane in &mut self.lanes {
            lane.unbind();
        }
        self.active = 0;
    }
}

struct Concurrent<S> {
    name: Cow<'static, str>,
    children: Vec<NodeRef<S>>,
    gate: Option<Predicate<S>>,
    policy: LanePolicy,
    aggregate: Aggregate,
}

impl<S: Send + 'static> Concurrent<S> {
    fn new(name: &'static str, children: Vec<NodeRef<S>>, gate: Option<Predicate<S>>) -> Self {
        Self {
            name: Cow::Borrowed(name),
            children,
            gate,
            policy: LanePolicy::default(),
            aggregate: Aggregate::default(),
        }
    }

    fn gate_open(&self, cx: &TickContext<'_, S>) -> Result<bool, TickError> {
        match &self.gate {
            Some(gate) => callable::check(gate, &self.name, cx.state()),
            None => Ok(true),
        }
    }

    fn record(&self, pool: &Pool) -> Option<Box<dyn Recycle>> {
        let record: Box<dyn Recycle> = pool.take::<ConcurrentRecord<S>>();
        Some(record)
    }

    fn arm(&self, record: &mut ConcurrentRecord<S>, cx: &mut TickContext<'_, S>) {
        for (i, child) in self.children.iter().enumerate() {
            match record.lanes.get_mut(i) {
                Some(lane) => lane.bind(child.clone(), self.policy),
                None => record.lanes.push(Lane::new(child.clone(), self.policy)),
            }
            cx.adopt(&mut record.lanes[i]);
        }
        record.active = self.children.len();
        tracing::trace!(node = %self.name, lanes = record.active, "lanes armed");
    }

    /// Advance every lane once. Returns the aggregate once all of them are complete.
    fn step(
        &self,
        record: &mut ConcurrentRecord<S>,
        cx: &mut TickContext<'_, S>,
    ) -> Result<Option<Status>, TickError> {
        let lanes = &mut record.lanes[..record.active];
        for lane in lanes.iter_mut() {
            lane.advance(cx)?;
        }

        if lanes.iter().all(|lane| lane.is_complete()) {
            let status = self.aggregate.fold(lanes.iter().map(|lane| lane.result()));
            return Ok(Some(status));
        }
        Ok(None)
    }

    fn disarm(&self, record: &mut ConcurrentRecord<S>, cx: &mut TickContext<'_, S>) {
        for lane in record.lanes[..record.active].iter_mut() {
            cx.disown(lane.id());
            lane.reset(cx);
        }
        record.active = 0;
    }

    fn tick(&self, frame: &mut Frame, cx: &mut TickContext<'_, S>) -> Result<Step<S>, TickError> {
        if self.children.is_empty() {
            return Ok(Step::Done(Status::Failure));
        }

        let entering = frame.point() == 0;
        let open = self.gate_open(cx)?;
        let record = frame.record::<ConcurrentRecord<S>>(&self.name)?;

        if entering {
            if !open {
                return Ok(Step::Done(Status::Failure));
            }
            self.arm(record, cx);
        } else if !open {
            tracing::debug!(node = %self.name, lanes = record.active, "gate closed; aborting lanes");
            self.disarm(record, cx);
            return Ok(Step::Done(Status::Failure));
        }

        if let Some(status) = self.step(record, cx)? {
            self.disarm(record, cx);
            return Ok(Step::Done(status));
        }
        Ok(frame.yield_at(RESUME))
    }

    fn terminate(&self, frame: &mut Frame, cx: &mut TickContext<'_, S>) {
        if let Ok(record) = frame.record::<ConcurrentRecord<S>>(&self.name) {
            self.disarm(record, cx);
        }
    }
}

macro_rules! concurrent_node {
    ($ty:ident) => {
        impl<S: Send + 'static> Node<S> for $ty<S> {
            fn name(&self) -> &str {
                &self.0.name
            }

            fn children(&self) -> &[NodeRef<S>] {
                &self.0.children
            }

            fn record(&self, pool: &Pool) -> Option<Box<dyn Recycle>> {
                self.0.record(pool)
            }

            fn tick(
                &self,
                frame: &mut Frame,
                cx: &mut TickContext<'_, S>,
            ) -> Result<Step<S>, TickError> {
                self.0.tick(frame, cx)
            }

            fn terminate(&self, frame: &mut Frame, cx: &mut TickContext<'_, S>) {
                self.0.terminate(frame, cx)
            }
        }

        impl<S> $ty<S> {
            pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
                self.0.name = name.into();
                self
            }
        }
    };
}

/// Runs every child concurrently and completes once all of them have.
///
/// Lanes run one activation each by default; see [`Parallel::with_policy`]. Zero children fail.
pub struct Parallel<S>(Concurrent<S>);

impl<S: Send + 'static> Parallel<S> {
    pub fn new(children: Vec<NodeRef<S>>) -> Self {
        Self(Concurrent::new("parallel", children, None))
    }

    pub fn with_policy(mut self, policy: LanePolicy) -> Self {
        self.0.policy = policy;
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.0.aggregate = aggregate;
        self
    }
}

/// [`Parallel`] guarded by a predicate checked on entry and before every resumption.
///
/// When the gate closes mid-flight every outstanding lane is reset on the spot, running the
/// termination hooks of its active nodes, and the composite fails.
pub struct ParallelFilter<S>(Concurrent<S>);

impl<S: Send + 'static> ParallelFilter<S> {
    pub fn new(gate: impl Fn(&S) -> bool + Send + Sync + 'static, children: Vec<NodeRef<S>>) -> Self {
        Self(Concurrent::new(
            "parallel_filter",
            children,
            Some(callable::predicate(gate)),
        ))
    }

    pub fn try_new(
        gate: impl Fn(&S) -> Result<bool, Fault> + Send + Sync + 'static,
        children: Vec<NodeRef<S>>,
    ) -> Self {
        Self(Concurrent::new(
            "parallel_filter",
            children,
            Some(callable::try_predicate(gate)),
        ))
    }

    pub fn with_policy(mut self, policy: LanePolicy) -> Self {
        self.0.policy = policy;
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.0.aggregate = aggregate;
        self
    }
}

/// Gated concurrent composite whose lanes each run exactly one activation.
/// Succeeds if any lane succeeded.
pub struct Interrupt<S>(Concurrent<S>);

impl<S: Send + 'static> Interrupt<S> {
    pub fn new(gate: impl Fn(&S) -> bool + Send + Sync + 'static, children: Vec<NodeRef<S>>) -> Self {
        Self::from_gate(callable::predicate(gate), children)
    }

    pub fn try_new(
        gate: impl Fn(&S) -> Result<bool, Fault> + Send + Sync + 'static,
        children: Vec<NodeRef<S>>,
    ) -> Self {
        Self::from_gate(callable::try_predicate(gate), children)
    }

    fn from_gate(gate: Predicate<S>, children: Vec<NodeRef<S>>) -> Self {
        let mut inner = Concurrent::new("interrupt", children, Some(gate));
        inner.policy = LanePolicy::passes(1);
        inner.aggregate = Aggregate::Any;
        Self(inner)
    }
}

concurrent_node!(Parallel);
concurrent_node!(ParallelFilter);
concurrent_node!(Interrupt);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_needs_one_success() {
        use Status::*;
        assert_eq!(Aggregate::Any.fold([Failure, Success, Failure]), Success);
        assert_eq!(Aggregate::Any.fold([Failure, Failure]), Failure);
        assert_eq!(Aggregate::Any.fold(Vec::new()), Failure);
    }

    #[test]
    fn all_needs_every_success() {
        use Status::*;
        assert_eq!(Aggregate::All.fold([Success, Success]), Success);
        assert_eq!(Aggregate::All.fold([Success, Failure]), Failure);
    }
}
