use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use coro_core::{
    ActiveStacks, Coroutine, LaneId, NodeObserver, NodeRef, Pool, Scheduler, Status, TickContext, TickError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeConfig {
    /// Envelopes allocated up front so the first passes do not hit the allocator.
    pub prewarm_frames: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { prewarm_frames: 16 }
    }
}

/// Owns one root node and the top-level scheduler driving it, plus the active-node stack of
/// every lane running under it.
pub struct BehaviourTree<S> {
    root: NodeRef<S>,
    scheduler: Scheduler<S>,
    pool: Arc<Pool>,
    observers: Vec<Box<dyn NodeObserver<S>>>,
    lane: LaneId,
    owned: Vec<LaneId>,
    stacks: ActiveStacks,
    passes: u64,
    config: TreeConfig,
}

impl<S: Send + 'static> BehaviourTree<S> {
    pub fn new(root: NodeRef<S>) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    pub fn with_config(root: NodeRef<S>, config: TreeConfig) -> Self {
        Self::with_pool(root, Arc::new(Pool::new()), config)
    }

    /// Build a tree that draws envelopes and records from a pool shared with other trees.
    pub fn with_pool(root: NodeRef<S>, pool: Arc<Pool>, config: TreeConfig) -> Self {
        pool.pre_warm::<Coroutine<S>>(config.prewarm_frames);
        Self {
            scheduler: Scheduler::new(root.clone()),
            root,
            pool,
            observers: Vec::new(),
            lane: LaneId::next(),
            owned: Vec::new(),
            stacks: ActiveStacks::new(),
            passes: 0,
            config,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn NodeObserver<S>>) {
        self.observers.push(observer);
    }

    /// Run one external pass: start a fresh activation of the root or resume the suspended one.
    ///
    /// On error the suspended frames have already been terminated and released; the next call
    /// starts over from the root.
    pub fn advance(&mut self, state: &mut S) -> Result<(), TickError> {
        self.passes += 1;
        let mut cx = TickContext::new(state, &self.pool, self.passes)
            .with_observers(&mut self.observers)
            .with_lane(self.lane, &mut self.owned)
            .with_stacks(&mut self.stacks);
        let outcome = self.scheduler.advance(&mut cx);
        if outcome.is_err() {
            self.stacks.clear();
        }
        outcome
    }

    /// Terminate every active node and drop pending work. `tick_count` is kept.
    pub fn reset(&mut self, state: &mut S) {
        let mut cx = TickContext::new(state, &self.pool, self.passes)
            .with_observers(&mut self.observers)
            .with_lane(self.lane, &mut self.owned)
            .with_stacks(&mut self.stacks);
        self.scheduler.reset(&mut cx);
        self.stacks.clear();
    }

    /// Names of the suspended top-level frames, root first.
    pub fn active_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.scheduler.active_nodes()
    }
}

impl<S> BehaviourTree<S> {
    pub fn root(&self) -> &NodeRef<S> {
        &self.root
    }

    pub fn tick_count(&self) -> u64 {
        self.scheduler.tick_count()
    }

    pub fn result(&self) -> Status {
        self.scheduler.result()
    }

    /// External passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Lane id the top-level scheduler reports to observers.
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// Active nodes of the top-level lane and of every lane adopted beneath it, keyed by lane.
    pub fn active_stacks(&self) -> &ActiveStacks {
        &self.stacks
    }

    /// Lanes currently adopted by composites on the top-level lane.
    pub fn owned_lanes(&self) -> &[LaneId] {
        &self.owned
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }
}
