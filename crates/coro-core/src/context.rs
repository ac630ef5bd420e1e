use std::sync::{Arc, Mutex, PoisonError};

use crate::{ActiveStacks, Lane, LaneId, Node, Pool};

/// Receives activation notifications around every node `Execute`.
///
/// Used by inspectors and debuggers; the engine itself never depends on what observers do.
pub trait NodeObserver<S>: Send {
    fn on_node_active(&mut self, _lane: LaneId, _node: &dyn Node<S>) {}

    fn on_node_inactive(&mut self, _lane: LaneId, _node: &dyn Node<S>) {}
}

/// Shared observer, so the host can keep reading it after handing a clone to a tree.
impl<S, O: NodeObserver<S>> NodeObserver<S> for Arc<Mutex<O>> {
    fn on_node_active(&mut self, lane: LaneId, node: &dyn Node<S>) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_node_active(lane, node);
    }

    fn on_node_inactive(&mut self, lane: LaneId, node: &dyn Node<S>) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_node_inactive(lane, node);
    }
}

/// Everything a node may touch while it runs: the external state, the shared pool, and the
/// lane bookkeeping of the scheduler currently driving it.
///
/// Passed explicitly into every `tick`; there is no ambient "current scheduler".
pub struct TickContext<'a, S> {
    state: &'a mut S,
    pool: &'a Pool,
    observers: &'a mut [Box<dyn NodeObserver<S>>],
    lane: LaneId,
    pass: u64,
    owned: Option<&'a mut Vec<LaneId>>,
    stacks: Option<&'a mut ActiveStacks>,
}

impl<'a, S: 'static> TickContext<'a, S> {
    /// Context for external pass `pass`. Lanes are advanced at most once per distinct pass.
    pub fn new(state: &'a mut S, pool: &'a Pool, pass: u64) -> Self {
        Self {
            state,
            pool,
            observers: Default::default(),
            lane: LaneId::DETACHED,
            pass,
            owned: None,
            stacks: None,
        }
    }

    pub fn with_observers(mut self, observers: &'a mut [Box<dyn NodeObserver<S>>]) -> Self {
        self.observers = observers;
        self
    }

    /// Mirror activations of this context and every lane forked from it into `stacks`.
    pub fn with_stacks(mut self, stacks: &'a mut ActiveStacks) -> Self {
        self.stacks = Some(stacks);
        self
    }

    /// Run as `lane`, collecting the ids of lanes adopted during the call into `owned`.
    pub fn with_lane(mut self, lane: LaneId, owned: &'a mut Vec<LaneId>) -> Self {
        self.lane = lane;
        self.owned = Some(owned);
        self
    }

    #[inline]
    pub fn state(&self) -> &S {
        &*self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    #[inline]
    pub fn pool(&self) -> &'a Pool {
        self.pool
    }

    /// External pass number.
    #[inline]
    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Lane whose scheduler is currently running.
    #[inline]
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// Register `lane` as driven by the current lane.
    pub fn adopt(&mut self, lane: &mut Lane<S>) {
        lane.add_input(self.lane);
        if let Some(owned) = self.owned.as_deref_mut() {
            if !owned.contains(&lane.id()) {
                owned.push(lane.id());
            }
        }
    }

    /// Drop a dependency registered with [`TickContext::adopt`].
    pub fn disown(&mut self, lane: LaneId) {
        if let Some(owned) = self.owned.as_deref_mut() {
            owned.retain(|id| *id != lane);
        }
    }

    pub(crate) fn fork<'b>(
        &'b mut self,
        lane: LaneId,
        owned: &'b mut Vec<LaneId>,
    ) -> TickContext<'b, S> {
        TickContext {
            state: &mut *self.state,
            pool: self.pool,
            observers: &mut *self.observers,
            lane,
            pass: self.pass,
            owned: Some(owned),
            stacks: self.stacks.as_deref_mut(),
        }
    }

    pub(crate) fn activated(&mut self, node: &dyn Node<S>) {
        tracing::trace!(lane = %self.lane, node = node.name(), "node active");
        if let Some(stacks) = self.stacks.as_deref_mut() {
            stacks.push(self.lane, node.name());
        }
        for observer in self.observers.iter_mut() {
            observer.on_node_active(self.lane, node);
        }
    }

    pub(crate) fn deactivated(&mut self, node: &dyn Node<S>) {
        tracing::trace!(lane = %self.lane, node = node.name(), "node inactive");
        if let Some(stacks) = self.stacks.as_deref_mut() {
            stacks.pop(self.lane, node.name());
        }
        for observer in self.observers.iter_mut() {
            observer.on_node_inactive(self.lane, node);
        }
    }
}
