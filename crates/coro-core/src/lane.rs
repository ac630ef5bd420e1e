//! Independently scheduled execution lanes for concurrent branches.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{NodeRef, Scheduler, Status, TickContext, TickError};

static NEXT_LANE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaneId(u64);

impl LaneId {
    /// Lane of a context that is not running on behalf of any registered lane.
    pub const DETACHED: LaneId = LaneId(0);

    pub fn next() -> Self {
        LaneId(NEXT_LANE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LanePolicy {
    /// Full activations of the root before the lane reports complete. Clamped to at least 1.
    pub required_passes: u32,

    /// Never report complete; the root is simply restarted after every activation.
    pub never_completes: bool,
}

impl Default for LanePolicy {
    fn default() -> Self {
        Self {
            required_passes: 1,
            never_completes: false,
        }
    }
}

impl LanePolicy {
    pub fn passes(required_passes: u32) -> Self {
        Self {
            required_passes: required_passes.max(1),
            never_completes: false,
        }
    }

    pub fn forever() -> Self {
        Self {
            required_passes: 1,
            never_completes: true,
        }
    }
}

/// A [`Scheduler`] bound to one sub-root node, with a completion policy and dependency sets.
pub struct Lane<S> {
    id: LaneId,
    scheduler: Scheduler<S>,
    policy: LanePolicy,
    passes: u32,
    complete: bool,
    last_pass: Option<u64>,
    inputs: Vec<LaneId>,
    outputs: Vec<LaneId>,
}

impl<S> Lane<S> {
    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn policy(&self) -> LanePolicy {
        self.policy
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Result of the lane's last completed activation (`Running` before the first one).
    pub fn result(&self) -> Status {
        self.scheduler.result()
    }

    /// Full activations since the last reset.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Lanes whose schedulers drive this one.
    ///
    /// Inspection only: scheduling never reads the dependency sets. A lane is advanced by
    /// whichever composite owns it, and the pass stamp keeps that to once per pass.
    pub fn inputs(&self) -> &[LaneId] {
        &self.inputs
    }

    /// Lanes adopted by composites running on this lane. Inspection only, like
    /// [`Lane::inputs`].
    pub fn outputs(&self) -> &[LaneId] {
        &self.outputs
    }

    pub fn is_bound(&self) -> bool {
        self.scheduler.root().is_some()
    }

    /// Release the root node of an idle lane. [`Lane::bind`] arms it again.
    pub fn unbind(&mut self) {
        self.scheduler.unbind();
    }

    pub(crate) fn add_input(&mut self, owner: LaneId) {
        if !self.inputs.contains(&owner) {
            self.inputs.push(owner);
        }
    }
}

impl<S: Send + 'static> Lane<S> {
    pub fn new(root: NodeRef<S>, policy: LanePolicy) -> Self {
        Self {
            id: LaneId::next(),
            scheduler: Scheduler::new(root),
            policy,
            passes: 0,
            complete: false,
            last_pass: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Re-arm an idle lane for a different root or policy.
    pub fn bind(&mut self, root: NodeRef<S>, policy: LanePolicy) {
        self.scheduler.bind(root);
        self.policy = policy;
        self.passes = 0;
        self.complete = false;
        self.last_pass = None;
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.scheduler.active_nodes()
    }

    /// Step the lane's scheduler once. No-op when the lane is complete or has already been
    /// advanced during this external pass.
    pub fn advance(&mut self, cx: &mut TickContext<'_, S>) -> Result<(), TickError> {
        if self.complete || self.last_pass == Some(cx.pass()) {
            return Ok(());
        }
        self.last_pass = Some(cx.pass());

        let before = self.scheduler.tick_count();
        {
            let mut inner = cx.fork(self.id, &mut self.outputs);
            self.scheduler.advance(&mut inner)?;
        }

        if self.scheduler.tick_count() != before {
            self.passes += 1;
            if !self.policy.never_completes && self.passes >= self.policy.required_passes.max(1) {
                self.complete = true;
            }
        }
        Ok(())
    }

    /// Terminate active nodes and clear scheduler state, dependency sets and counters.
    pub fn reset(&mut self, cx: &mut TickContext<'_, S>) {
        {
            let mut inner = cx.fork(self.id, &mut self.outputs);
            self.scheduler.reset(&mut inner);
        }
        self.passes = 0;
        self.complete = false;
        self.last_pass = None;
        self.inputs.clear();
        self.outputs.clear();
    }
}
