use crate::error::SimError;
use crate::net::{
    DataPacketGen, EventArgs, NetWorld, Network, NodeId, ONE_HOP_DELAY, SimpleLink,
};
use crate::proto::{SdnController, SdnSwitch, TraSwitch, TrafficMatrix, Weight};
use crate::sim::{SimTime, Simulator, event_priority};

fn n(id: u32) -> NodeId {
    NodeId(id)
}

fn tra_line(count: u32) -> Network {
    let mut net = Network::default();
    for id in 0..count {
        net.add_node(TraSwitch::TYPE, n(id)).expect("add node");
    }
    net
}

#[test]
fn add_node_rejects_duplicates_reserved_ids_and_unknown_types() {
    let mut net = tra_line(1);
    assert_eq!(
        net.add_node(TraSwitch::TYPE, n(0)),
        Err(SimError::DuplicateNode(n(0)))
    );
    assert_eq!(
        net.add_node(TraSwitch::TYPE, NodeId::BROADCAST),
        Err(SimError::ReservedId)
    );
    assert!(matches!(
        net.add_node("no_such_switch", n(1)),
        Err(SimError::UnknownType { family: "node", .. })
    ));
    assert_eq!(net.node_count(), 1);
}

#[test]
fn phy_neighbor_maintenance_reports_each_failure() {
    let mut net = tra_line(3);
    net.add_phy_neighbor(n(0), n(1), SimpleLink::TYPE).expect("link");
    assert_eq!(
        net.add_phy_neighbor(n(0), n(1), SimpleLink::TYPE),
        Err(SimError::DuplicateLink {
            from: n(0),
            to: n(1)
        })
    );
    assert_eq!(
        net.add_phy_neighbor(n(0), n(7), SimpleLink::TYPE),
        Err(SimError::UnknownNode(n(7)))
    );
    assert_eq!(
        net.add_phy_neighbor(n(0), NodeId::BROADCAST, SimpleLink::TYPE),
        Err(SimError::ReservedId)
    );
    // Self-loops are ignored.
    assert_eq!(net.add_phy_neighbor(n(2), n(2), SimpleLink::TYPE), Ok(()));
    assert_eq!(net.link_count(), 1);
    assert!(net.node(n(2)).expect("node 2").neighbors().is_empty());

    // Links are directed.
    assert!(net.link(n(0), n(1)).is_some());
    assert!(net.link(n(1), n(0)).is_none());

    net.remove_phy_neighbor(n(0), n(1)).expect("remove link");
    assert!(net.node(n(0)).expect("node 0").neighbors().is_empty());
    assert!(matches!(
        net.remove_phy_neighbor(n(0), n(1)),
        Err(SimError::UnknownLink { .. })
    ));
}

#[test]
fn remove_node_drops_its_links_and_neighbor_entries() {
    let mut net = tra_line(3);
    net.connect(n(0), n(1), ONE_HOP_DELAY).expect("connect");
    net.connect(n(1), n(2), ONE_HOP_DELAY).expect("connect");
    assert_eq!(net.link_count(), 4);

    net.remove_node(n(1)).expect("remove node");
    assert_eq!(net.link_count(), 0);
    assert!(net.node(n(0)).expect("node 0").neighbors().is_empty());
    assert!(net.node(n(2)).expect("node 2").neighbors().is_empty());
    assert!(matches!(
        net.remove_node(n(1)),
        Err(SimError::UnknownNode(_))
    ));
}

#[test]
fn seeding_validates_node_ids() {
    let net = tra_line(2);
    let mut sim = Simulator::default();
    assert_eq!(
        net.schedule_data_packet(&mut sim, n(0), n(5), 1.0, SimTime::ZERO, ""),
        Err(SimError::UnknownNode(n(5)))
    );
    assert_eq!(
        net.schedule_flood(&mut sim, n(9), SimTime::ZERO, ""),
        Err(SimError::UnknownNode(n(9)))
    );
    assert_eq!(
        net.schedule_invoke(&mut sim, n(3), TrafficMatrix::new(2), SimTime::ZERO, ""),
        Err(SimError::UnknownNode(n(3)))
    );
    assert_eq!(sim.pending(), 0);
}

#[test]
fn emit_with_mismatched_arguments_is_a_contract_violation() {
    let net = Network::default();
    let mut sim = Simulator::default();
    let err = net
        .emit(
            &mut sim,
            SimTime::ZERO,
            DataPacketGen::TYPE,
            EventArgs::FloodGen {
                src: n(0),
                msg: String::new(),
            },
        )
        .expect_err("mismatched args");
    assert!(matches!(
        err,
        SimError::ContractViolation {
            found: "flood_gen",
            ..
        }
    ));
    assert!(!err.is_fatal());
    assert!(matches!(
        net.create_event(
            "no_such_event",
            EventArgs::FloodGen {
                src: n(0),
                msg: String::new()
            }
        ),
        Err(SimError::UnknownType { .. })
    ));
}

#[test]
fn data_without_a_route_is_dropped() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    for id in 0..2 {
        world.net.add_node(TraSwitch::TYPE, n(id)).expect("add node");
    }
    world.net.connect(n(0), n(1), ONE_HOP_DELAY).expect("connect");
    world
        .net
        .schedule_data_packet(&mut sim, n(0), n(1), 4.0, SimTime::ZERO, "")
        .expect("schedule data");
    sim.run(&mut world).expect("run");

    assert_eq!(world.net.stats.dropped_pkts, 1);
    assert_eq!(world.net.stats.delivered_pkts, 0);
    assert_eq!(world.net.live_packets(), 0);
}

/// Switches 0..5 (1 is SDN) and controller 6 attached to 1.
/// Traffic 5 -> 0 gets split at 1 between the direct hop and the detour via 2.
fn controller_world() -> (Simulator, NetWorld) {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let net = &mut world.net;
    for id in 0..6 {
        let kind = if id == 1 { SdnSwitch::TYPE } else { TraSwitch::TYPE };
        net.add_node(kind, n(id)).expect("add node");
    }
    net.add_node(SdnController::TYPE, n(6)).expect("add controller");
    for (a, b) in [(0, 1), (0, 2), (1, 2), (1, 5), (2, 3), (3, 4), (1, 6)] {
        net.connect(n(a), n(b), ONE_HOP_DELAY).expect("connect");
    }

    let mut matrix = TrafficMatrix::new(6);
    matrix.set_demand(n(0), n(5), 100.0).expect("demand");
    matrix.mark_destination(n(0)).expect("destination");

    net.schedule_flood(&mut sim, n(0), SimTime::ZERO, "")
        .expect("schedule flood");
    net.schedule_invoke(&mut sim, n(6), matrix, SimTime(100), "")
        .expect("schedule invoke");
    net.schedule_data_packet(&mut sim, n(5), n(0), 100.0, SimTime(200), "")
        .expect("schedule data");
    (sim, world)
}

#[test]
fn controller_installs_split_rules_and_data_follows_them() {
    let (mut sim, mut world) = controller_world();
    let stats = sim.run_until(SimTime(400), &mut world).expect("run");
    assert!(stats.executed > 0);
    let net = &world.net;

    let s1 = net.node_as::<SdnSwitch>(n(1)).expect("node 1");
    let entries = s1.paths().entries(n(0));
    let mut hops: Vec<_> = entries.iter().map(|e| (e.next_hop, e.weight)).collect();
    // Install order follows the scheduler's tie-break; compare as a set.
    hops.sort_by_key(|(next, _)| *next);
    assert_eq!(
        hops,
        [(n(0), Weight::Share(0.5)), (n(2), Weight::Share(0.5))]
    );
    assert!((s1.paths().total_share(n(0)) - 1.0).abs() < 1e-9);
    // Rules leave the flood table alone.
    assert_eq!(s1.underlay().next_hop(n(0)), Some(n(0)));

    // Half goes straight to 0, half through 2.
    assert_eq!(net.stats.delivered_pkts, 2);
    assert!((net.stats.delivered_volume - 100.0).abs() < 1e-9);
    assert_eq!(net.stats.dropped_pkts, 0);
    assert_eq!(net.live_packets(), 0);
}

#[test]
fn data_before_rules_follows_the_underlay_route() {
    let (mut sim, mut world) = controller_world();
    world
        .net
        .schedule_data_packet(&mut sim, n(5), n(0), 30.0, SimTime(60), "early")
        .expect("schedule data");
    sim.run_until(SimTime(99), &mut world).expect("run");

    assert_eq!(world.net.stats.delivered_pkts, 1);
    assert!((world.net.stats.delivered_volume - 30.0).abs() < 1e-9);
    let s1 = world.net.node_as::<SdnSwitch>(n(1)).expect("node 1");
    assert_eq!(s1.paths().entries(n(0))[0].weight, Weight::Underlay);
}

#[test]
fn packet_ids_are_never_reused() {
    let (mut sim, mut world) = controller_world();
    let before = world.net.packets().peek_next_id();
    sim.run_until(SimTime(400), &mut world).expect("run");
    let after = world.net.packets().peek_next_id();
    // Flood, invoke, rule and data packets each take fresh ids.
    assert!(after >= before + 4);
    assert_eq!(world.net.live_packets(), 0);
}

/// Controller 2 pushes two rules for destination 0 to SDN switch 1 at the same time.
fn install_two_rules(acts: [u32; 2]) -> Vec<NodeId> {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let net = &mut world.net;
    net.add_node(TraSwitch::TYPE, n(0)).expect("add node");
    net.add_node(SdnSwitch::TYPE, n(1)).expect("add node");
    net.add_node(SdnController::TYPE, n(2)).expect("add controller");
    net.connect(n(0), n(1), ONE_HOP_DELAY).expect("connect");
    net.connect(n(1), n(2), ONE_HOP_DELAY).expect("connect");
    for act in acts {
        net.schedule_rule(&mut sim, n(2), n(1), n(0), n(act), 0.5, SimTime(50), "")
            .expect("schedule rule");
    }
    sim.run(&mut world).expect("run");
    assert_eq!(world.net.live_packets(), 0);
    let s1 = world.net.node_as::<SdnSwitch>(n(1)).expect("node 1");
    s1.paths().entries(n(0)).iter().map(|e| e.next_hop).collect()
}

#[test]
fn same_time_rules_install_in_priority_order_not_emission_order() {
    let at = SimTime(50);
    // Generation events run in priority order and mint packet ids 0 and 1 in that order.
    let rule_gen = |act: u32| event_priority(at, &format!("210{act}"));
    let (first, second) = if rule_gen(0) > rule_gen(3) { (0, 3) } else { (3, 0) };
    // The rule packets reach switch 1 one hop later, ordered by (controller, switch, packet id).
    let arrive = at.after(ONE_HOP_DELAY);
    let recv = |pkt_id: u64| event_priority(arrive, &format!("21{pkt_id}"));
    assert_ne!(recv(0), recv(1));
    let expected = if recv(0) > recv(1) {
        [n(first), n(second)]
    } else {
        [n(second), n(first)]
    };

    assert_eq!(install_two_rules([0, 3]), expected);
    assert_eq!(install_two_rules([3, 0]), expected);
}
