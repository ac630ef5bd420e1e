use std::sync::{Arc, Mutex};

use coro_core::{
    Frame, LaneId, Node, NodeObserver, NodeRef, Pool, Scheduler, Status, Step, TickContext,
    TickError,
};
use coro_tools::{ActiveStacks, TraceEvent, TraceLog, TraceObserver, NODE_ACTIVE, NODE_INACTIVE};

/// Yields once, then succeeds.
struct Pause;

impl Node<()> for Pause {
    fn name(&self) -> &str {
        "pause"
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, ()>) -> Result<Step<()>, TickError> {
        match frame.point() {
            0 => Ok(frame.yield_at(1)),
            _ => Ok(Step::Done(Status::Success)),
        }
    }
}

/// Calls its child and forwards the result.
struct Wrap(NodeRef<()>);

impl Node<()> for Wrap {
    fn name(&self) -> &str {
        "wrap"
    }

    fn tick(&self, frame: &mut Frame, _cx: &mut TickContext<'_, ()>) -> Result<Step<()>, TickError> {
        match frame.point() {
            0 => Ok(frame.call_at(1, &self.0)),
            _ => Ok(Step::Done(frame.take_awaited().unwrap_or(Status::Failure))),
        }
    }
}

fn run(observers: &mut [Box<dyn NodeObserver<()>>], lane: LaneId, passes: u64) -> Scheduler<()> {
    let pool = Pool::new();
    let mut owned = Vec::new();
    let mut scheduler = Scheduler::new(Arc::new(Wrap(Arc::new(Pause))) as NodeRef<()>);
    for pass in 1..=passes {
        let mut state = ();
        let mut cx = TickContext::new(&mut state, &pool, pass)
            .with_observers(&mut *observers)
            .with_lane(lane, &mut owned);
        scheduler.advance(&mut cx).unwrap();
    }
    scheduler
}

#[test]
fn observer_records_activation_order() {
    let lane = LaneId::next();
    let log = Arc::new(Mutex::new(TraceLog::new()));
    let mut observers: Vec<Box<dyn NodeObserver<()>>> =
        vec![Box::new(TraceObserver::new(log.clone()))];

    let scheduler = run(&mut observers, lane, 2);
    assert_eq!(scheduler.tick_count(), 1);

    let log = log.lock().unwrap();
    let active: Vec<_> = log.nodes_tagged(NODE_ACTIVE).collect();
    let inactive: Vec<_> = log.nodes_tagged(NODE_INACTIVE).collect();
    assert_eq!(active, ["wrap", "pause"]);
    assert_eq!(inactive, ["pause", "wrap"]);

    let seqs: Vec<_> = log.events().map(|e| e.seq).collect();
    assert_eq!(seqs, [1, 2, 3, 4]);
    assert_eq!(log.on_lane(lane).count(), 4);
    assert_eq!(log.on_lane(LaneId::DETACHED).count(), 0);
}

#[test]
fn active_stacks_track_suspended_frames() {
    let lane = LaneId::next();
    let stacks = Arc::new(Mutex::new(ActiveStacks::new()));
    let mut observers: Vec<Box<dyn NodeObserver<()>>> = vec![Box::new(stacks.clone())];

    run(&mut observers, lane, 1);
    {
        let stacks = stacks.lock().unwrap();
        assert_eq!(stacks.lanes().collect::<Vec<_>>(), [lane]);
        assert_eq!(stacks.stack(lane), ["wrap", "pause"]);
        assert_eq!(stacks.depth(), 2);
    }

    stacks.lock().unwrap().clear();
    run(&mut observers, lane, 2);
    assert!(stacks.lock().unwrap().is_empty(), "completed activations leave nothing active");
}

#[test]
fn vec_and_unit_sinks_accept_events() {
    let events = Arc::new(Mutex::new(Vec::<TraceEvent>::new()));
    let mut observers: Vec<Box<dyn NodeObserver<()>>> = vec![
        Box::new(TraceObserver::new(())),
        Box::new(TraceObserver::new(events.clone())),
    ];
    let scheduler = run(&mut observers, LaneId::next(), 2);
    assert_eq!(scheduler.result(), Status::Success);
    assert_eq!(events.lock().unwrap().len(), 4);
}
