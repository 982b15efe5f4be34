use crate::error::SimError;
use crate::sim::{Event, SimTime, Simulator, World, event_priority};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

struct Push {
    id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Push {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) {
        let Push { id, log } = *self;
        log.lock().expect("log lock").push(id);
    }

    fn type_name(&self) -> &'static str {
        "push"
    }

    fn identity(&self) -> String {
        self.id.to_string()
    }
}

struct PushThenScheduleAt {
    id: u32,
    next_id: u32,
    at: SimTime,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for PushThenScheduleAt {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let PushThenScheduleAt {
            id,
            next_id,
            at,
            log,
        } = *self;
        log.lock().expect("log lock").push(id);
        sim.schedule(at, Push { id: next_id, log });
    }

    fn type_name(&self) -> &'static str {
        "push_then_schedule"
    }

    fn identity(&self) -> String {
        self.id.to_string()
    }
}

fn push(id: u32, log: &Arc<Mutex<Vec<u32>>>) -> Push {
    Push {
        id,
        log: Arc::clone(log),
    }
}

#[test]
fn scheduled_events_order_by_time_first() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(10), push(1, &log));
    sim.schedule(SimTime(5), push(2, &log));
    sim.schedule(SimTime(20), push(3, &log));

    let mut world = DummyWorld::default();
    let stats = sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[2, 1, 3]);
    assert_eq!(stats.executed, 3);
    assert_eq!(world.ticks, 3);
    assert_eq!(sim.now(), SimTime(20));
}

#[test]
fn equal_time_ties_break_by_higher_priority_regardless_of_insertion() {
    let at = SimTime(10);
    let (p1, p2) = (
        event_priority(at, &1.to_string()),
        event_priority(at, &2.to_string()),
    );
    assert_ne!(p1, p2);
    let expected = if p1 > p2 { [1, 2] } else { [2, 1] };

    for order in [[1, 2], [2, 1]] {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sim = Simulator::default();
        for id in order {
            sim.schedule(at, push(id, &log));
        }
        sim.run(&mut DummyWorld::default()).expect("run");
        assert_eq!(&*log.lock().expect("log lock"), &expected);
    }
}

#[test]
fn priority_hash_is_stable_fnv1a() {
    // Time 0 with an empty identity hashes the single byte "0".
    assert_eq!(event_priority(SimTime(0), ""), {
        let mut h: u64 = 14695981039346656037;
        h ^= b'0' as u64;
        h.wrapping_mul(1099511628211)
    });
    assert_eq!(
        event_priority(SimTime(12), "3"),
        event_priority(SimTime(1), "23")
    );
}

#[test]
fn event_scheduled_at_same_time_inside_event_runs_after_current_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        PushThenScheduleAt {
            id: 1,
            next_id: 2,
            at: SimTime::ZERO,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), SimTime::ZERO);
}

#[test]
fn event_scheduled_in_the_past_halts_the_run() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(10),
        PushThenScheduleAt {
            id: 1,
            next_id: 2,
            at: SimTime(3),
            log: Arc::clone(&log),
        },
    );
    sim.schedule(SimTime(50), push(3, &log));

    let err = sim
        .run_until(SimTime(100), &mut DummyWorld::default())
        .expect_err("ordering violation");
    assert_eq!(
        err,
        SimError::OrderingViolation {
            now: SimTime(10),
            at: SimTime(3),
        }
    );
    assert!(err.is_fatal());
    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(sim.pending(), 0);
}

#[test]
fn run_until_releases_events_after_until_and_advances_time() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime::ZERO, push(1, &log));
    sim.schedule(SimTime(10), push(2, &log));

    let mut world = DummyWorld::default();
    let stats = sim.run_until(SimTime(5), &mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(stats.executed, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), SimTime(5));
    assert_eq!(sim.pending(), 0);

    sim.run(&mut world).expect("run");
    assert_eq!(&*log.lock().expect("log lock"), &[1]);
}

#[test]
fn run_until_executes_events_scheduled_exactly_at_until() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(5), push(1, &log));

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), SimTime(5));
}

#[test]
fn run_until_advances_time_even_if_there_are_no_events() {
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();

    let stats = sim.run_until(SimTime(7), &mut world).expect("run");
    assert_eq!(sim.now(), SimTime(7));
    assert_eq!(stats.final_time, SimTime(7));
    assert_eq!(world.ticks, 0);
}
