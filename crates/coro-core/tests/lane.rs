use std::sync::Arc;

use coro_core::{Frame, Lane, LaneId, LanePolicy, Node, Pool, Status, Step, TickContext, TickError};

#[derive(Debug, Default)]
struct World {
    ticks: u32,
    terminated: u32,
}

/// Suspends once per activation and succeeds on resume.
struct Blink;

impl Node<World> for Blink {
    fn name(&self) -> &str {
        "blink"
    }

    fn tick(&self, frame: &mut Frame, cx: &mut TickContext<'_, World>) -> Result<Step<World>, TickError> {
        cx.state_mut().ticks += 1;
        match frame.point() {
            0 => Ok(frame.yield_at(1)),
            _ => Ok(Step::Done(Status::Success)),
        }
    }

    fn terminate(&self, _frame: &mut Frame, cx: &mut TickContext<'_, World>) {
        cx.state_mut().terminated += 1;
    }
}

fn lane(policy: LanePolicy) -> Lane<World> {
    Lane::new(Arc::new(Blink), policy)
}

fn advance(lane: &mut Lane<World>, world: &mut World, pool: &Pool, pass: u64) {
    let mut cx = TickContext::new(world, pool, pass);
    lane.advance(&mut cx).unwrap();
}

#[test]
fn completes_after_required_passes() {
    let pool = Pool::new();
    let mut world = World::default();
    let mut lane = lane(LanePolicy::passes(2));

    for pass in 1..=3 {
        advance(&mut lane, &mut world, &pool, pass);
        assert!(!lane.is_complete(), "pass {pass}");
    }
    assert_eq!(lane.passes(), 1);

    advance(&mut lane, &mut world, &pool, 4);
    assert!(lane.is_complete());
    assert_eq!(lane.passes(), 2);
    assert_eq!(lane.result(), Status::Success);

    let ticks = world.ticks;
    advance(&mut lane, &mut world, &pool, 5);
    assert_eq!(world.ticks, ticks, "complete lanes ignore further passes");
}

#[test]
fn zero_required_passes_is_clamped_to_one() {
    assert_eq!(LanePolicy::passes(0).required_passes, 1);
}

#[test]
fn forever_lanes_keep_restarting() {
    let pool = Pool::new();
    let mut world = World::default();
    let mut lane = lane(LanePolicy::forever());

    for pass in 1..=10 {
        advance(&mut lane, &mut world, &pool, pass);
    }
    assert!(!lane.is_complete());
    assert_eq!(lane.passes(), 5);
}

#[test]
fn lanes_advance_once_per_pass() {
    let pool = Pool::new();
    let mut world = World::default();
    let mut lane = lane(LanePolicy::default());

    advance(&mut lane, &mut world, &pool, 1);
    advance(&mut lane, &mut world, &pool, 1);
    assert_eq!(world.ticks, 1);
    assert!(!lane.is_complete());

    advance(&mut lane, &mut world, &pool, 2);
    assert!(lane.is_complete());
}

#[test]
fn reset_terminates_active_nodes_and_clears_counters() {
    let pool = Pool::new();
    let mut world = World::default();
    let mut lane = lane(LanePolicy::passes(3));

    for pass in 1..=3 {
        advance(&mut lane, &mut world, &pool, pass);
    }
    assert_eq!(lane.passes(), 1);
    assert_eq!(lane.active_nodes().collect::<Vec<_>>(), ["blink"]);

    let mut cx = TickContext::new(&mut world, &pool, 3);
    lane.reset(&mut cx);
    assert_eq!(world.terminated, 1);
    assert_eq!(lane.passes(), 0);
    assert!(lane.is_idle());
    assert_eq!(lane.result(), Status::Running);

    // The pass stamp is cleared too, so the lane may run again within the same pass.
    advance(&mut lane, &mut world, &pool, 3);
    assert!(!lane.is_idle());
}

#[test]
fn adopt_records_both_directions_of_the_dependency() {
    let pool = Pool::new();
    let mut world = World::default();
    let owner = LaneId::next();
    let mut owned = Vec::new();
    let mut child = lane(LanePolicy::default());

    let mut cx = TickContext::new(&mut world, &pool, 1).with_lane(owner, &mut owned);
    cx.adopt(&mut child);
    cx.adopt(&mut child);
    assert_eq!(child.inputs(), [owner]);

    cx.disown(child.id());
    drop(cx);
    assert!(owned.is_empty());

    let mut cx = TickContext::new(&mut world, &pool, 1).with_lane(owner, &mut owned);
    cx.adopt(&mut child);
    drop(cx);
    assert_eq!(owned, [child.id()]);

    let mut cx = TickContext::new(&mut world, &pool, 1);
    child.reset(&mut cx);
    assert!(child.inputs().is_empty());
}

#[test]
fn unbound_lanes_drop_their_root_until_rebound() {
    let pool = Pool::new();
    let mut world = World::default();
    let root: Arc<Blink> = Arc::new(Blink);
    let mut lane = Lane::new(root.clone(), LanePolicy::default());
    assert_eq!(Arc::strong_count(&root), 2);

    lane.unbind();
    assert!(!lane.is_bound());
    assert_eq!(Arc::strong_count(&root), 1);

    let mut cx = TickContext::new(&mut world, &pool, 1);
    assert!(matches!(lane.advance(&mut cx), Err(TickError::Unbound)));
    drop(cx);

    lane.bind(root.clone(), LanePolicy::default());
    assert!(lane.is_bound());
    advance(&mut lane, &mut world, &pool, 2);
    advance(&mut lane, &mut world, &pool, 3);
    assert!(lane.is_complete());
}
