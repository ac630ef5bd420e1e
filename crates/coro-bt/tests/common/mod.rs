#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use coro_bt::{BehaviourTree, Frame, Node, NodeRef, Status, Step, TickContext, TickError};

/// Route engine logs to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
pub struct World {
    pub log: Vec<String>,
    pub terminated: Vec<String>,
    pub verdicts: HashMap<&'static str, bool>,
    pub gate: bool,
    pub counter: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            gate: true,
            ..Self::default()
        }
    }

    pub fn verdict(&self, name: &str) -> bool {
        self.verdicts.get(name).copied().unwrap_or(true)
    }

    pub fn set(&mut self, name: &'static str, verdict: bool) {
        self.verdicts.insert(name, verdict);
    }
}

/// Logs `name:pre`, suspends `suspensions` times, logs `name:post`, then reports
/// `World::verdict(name)`. Without suspensions it logs just `name`. Termination is recorded in
/// `World::terminated`.
pub struct Probe {
    name: &'static str,
    suspensions: u32,
}

impl Node<World> for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn tick(&self, frame: &mut Frame, cx: &mut TickContext<'_, World>) -> Result<Step<World>, TickError> {
        if self.suspensions == 0 {
            cx.state_mut().log.push(self.name.to_owned());
            return Ok(Step::Done(Status::from(cx.state().verdict(self.name))));
        }

        let point = frame.point();
        if point == 0 {
            cx.state_mut().log.push(format!("{}:pre", self.name));
        }
        if point < self.suspensions {
            return Ok(frame.yield_at(point + 1));
        }
        cx.state_mut().log.push(format!("{}:post", self.name));
        Ok(Step::Done(Status::from(cx.state().verdict(self.name))))
    }

    fn terminate(&self, _frame: &mut Frame, cx: &mut TickContext<'_, World>) {
        cx.state_mut().terminated.push(self.name.to_owned());
    }
}

pub fn probe(name: &'static str, suspensions: u32) -> NodeRef<World> {
    Arc::new(Probe { name, suspensions })
}

/// Leaf that logs its name and reports its verdict without suspending.
pub fn leaf(name: &'static str) -> NodeRef<World> {
    probe(name, 0)
}

/// Advance until the tree finishes one more activation. Returns the passes it took.
pub fn run_activation(tree: &mut BehaviourTree<World>, world: &mut World) -> u32 {
    let target = tree.tick_count() + 1;
    let mut passes = 0;
    while tree.tick_count() < target {
        tree.advance(world).expect("advance");
        passes += 1;
        assert!(passes < 1_000, "activation never finished");
    }
    passes
}
