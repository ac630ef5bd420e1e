use std::collections::BTreeMap;

use crate::{LaneId, Node, NodeObserver};

#[derive(Debug, Default, Clone)]
struct Stack {
    names: Vec<String>,
    len: usize,
}

/// Per-lane stacks of currently active node names, innermost last.
///
/// Name buffers are kept when entries are popped, so a lane that keeps running the same subtree
/// stops allocating once it has been through it once.
#[derive(Debug, Default, Clone)]
pub struct ActiveStacks {
    lanes: BTreeMap<LaneId, Stack>,
}

impl ActiveStacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self, lane: LaneId) -> &[String] {
        self.lanes
            .get(&lane)
            .map(|stack| &stack.names[..stack.len])
            .unwrap_or(&[])
    }

    /// Lanes with at least one active node.
    pub fn lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.lanes
            .iter()
            .filter(|(_, stack)| stack.len > 0)
            .map(|(lane, _)| *lane)
    }

    /// Active nodes across all lanes.
    pub fn depth(&self) -> usize {
        self.lanes.values().map(|stack| stack.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    pub fn push(&mut self, lane: LaneId, node: &str) {
        let stack = self.lanes.entry(lane).or_default();
        match stack.names.get_mut(stack.len) {
            Some(slot) => {
                slot.clear();
                slot.push_str(node);
            }
            None => stack.names.push(node.to_owned()),
        }
        stack.len += 1;
    }

    /// Remove the innermost entry for `node` on `lane`.
    pub fn pop(&mut self, lane: LaneId, node: &str) {
        let Some(stack) = self.lanes.get_mut(&lane) else {
            return;
        };
        let live = &mut stack.names[..stack.len];
        if let Some(pos) = live.iter().rposition(|name| name == node) {
            live[pos..].rotate_left(1);
            stack.len -= 1;
        }
    }

    /// Empty every stack, keeping the buffers.
    pub fn clear(&mut self) {
        for stack in self.lanes.values_mut() {
            stack.len = 0;
        }
    }
}

impl<S: 'static> NodeObserver<S> for ActiveStacks {
    fn on_node_active(&mut self, lane: LaneId, node: &dyn Node<S>) {
        self.push(lane, node.name());
    }

    fn on_node_inactive(&mut self, lane: LaneId, node: &dyn Node<S>) {
        self.pop(lane, node.name());
    }
}
