#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use coro_core::{LaneId, Node, NodeObserver};

pub const NODE_ACTIVE: &str = "node.active";
pub const NODE_INACTIVE: &str = "node.inactive";

/// A small, allocation-friendly trace event.
///
/// Plain data so it can be recorded while trees run and rendered later by tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    /// Position of the event in the stream that produced it.
    pub seq: u64,
    pub lane: u64,
    pub tag: Cow<'static, str>,
    pub node: String,
}

impl TraceEvent {
    pub fn new(seq: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            seq,
            lane: 0,
            tag: tag.into(),
            node: String::new(),
        }
    }

    pub fn with_lane(mut self, lane: LaneId) -> Self {
        self.lane = lane.get();
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }
}

/// Destination for trace events.
pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

/// Drops every event; useful when only the observer's sequence counter matters.
impl TraceSink for () {
    fn emit(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Lets a sink stay readable by the host after the observer holding it is handed to a tree.
impl<K: TraceSink> TraceSink for Arc<Mutex<K>> {
    fn emit(&mut self, event: TraceEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(event);
    }
}

/// In-memory event log, optionally bounded to the most recent `limit` events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    events: VecDeque<TraceEvent>,
    limit: Option<usize>,
    dropped: u64,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` events, discarding the oldest first.
    pub fn bounded(limit: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(limit),
            limit: Some(limit),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: TraceEvent) {
        if let Some(limit) = self.limit {
            if limit == 0 {
                self.dropped += 1;
                return;
            }
            if self.events.len() == limit {
                self.events.pop_front();
                self.dropped += 1;
            }
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted by the bound so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    /// Node names carried by events with `tag`, in emission order.
    pub fn nodes_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.events
            .iter()
            .filter(move |e| e.tag == tag)
            .map(|e| e.node.as_str())
    }

    pub fn on_lane(&self, lane: LaneId) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |e| e.lane == lane.get())
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Observer that turns activation notifications into [`TraceEvent`]s.
#[derive(Debug, Default)]
pub struct TraceObserver<K> {
    sink: K,
    seq: u64,
}

impl<K: TraceSink> TraceObserver<K> {
    pub fn new(sink: K) -> Self {
        Self { sink, seq: 0 }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.seq
    }

    fn record(&mut self, tag: &'static str, lane: LaneId, node: &str) {
        self.seq += 1;
        let event = TraceEvent::new(self.seq, tag)
            .with_lane(lane)
            .with_node(node);
        self.sink.emit(event);
    }
}

impl<S: 'static, K> NodeObserver<S> for TraceObserver<K>
where
    K: TraceSink + Send,
{
    fn on_node_active(&mut self, lane: LaneId, node: &dyn Node<S>) {
        self.record(NODE_ACTIVE, lane, node.name());
    }

    fn on_node_inactive(&mut self, lane: LaneId, node: &dyn Node<S>) {
        self.record(NODE_INACTIVE, lane, node.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_log_keeps_the_newest_events() {
        let mut log = TraceLog::bounded(2);
        for seq in 1..=3 {
            log.push(TraceEvent::new(seq, NODE_ACTIVE));
        }
        let seqs: Vec<_> = log.events().map(|e| e.seq).collect();
        assert_eq!(seqs, [2, 3]);
        assert_eq!(log.dropped(), 1);

        let mut none = TraceLog::bounded(0);
        none.push(TraceEvent::new(1, NODE_ACTIVE));
        assert!(none.is_empty());
        assert_eq!(none.dropped(), 1);
    }
}
