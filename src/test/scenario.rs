use crate::error::ScenarioError;
use crate::net::{NodeId, ONE_HOP_DELAY};
use crate::scenario::{
    DemandSpec, DestinationSpec, LinkSpec, RouteLine, Scenario, ScenarioOpts, WeightedHop,
    format_general,
};
use crate::sim::SimTime;

fn n(id: u32) -> NodeId {
    NodeId(id)
}

/// Six switches, SDN switch 1, destination 0 flooded at 0, one 5 -> 0 demand.
const SPLIT_INPUT: &str = "
6 1 1 6 1 400 100
1
0
0 0
0 0 1
1 0 2
2 1 2
3 1 5
4 2 3
5 3 4
0 5 0 100 200
";

#[test]
fn parses_text_input_in_order() {
    let sc = Scenario::parse(SPLIT_INPUT).expect("parse");
    assert_eq!(sc.node_count, 6);
    assert_eq!(sc.sdn_nodes, [n(1)]);
    assert_eq!(
        sc.destinations,
        [DestinationSpec {
            id: n(0),
            flood_at: SimTime::ZERO
        }]
    );
    assert_eq!(sc.links.len(), 6);
    assert_eq!(sc.links[3], LinkSpec { a: n(1), b: n(5) });
    assert_eq!(
        sc.demands,
        [DemandSpec {
            src: n(5),
            dst: n(0),
            volume: 100.0,
            start: SimTime(200),
        }]
    );
    assert_eq!(sc.end_time, SimTime(400));
    assert_eq!(sc.invoke_time, SimTime(100));
    assert_eq!(sc.controller_id(), n(6));
}

#[test]
fn truncated_input_names_the_missing_field() {
    let err = Scenario::parse("4 1 1 0 0 100").expect_err("truncated");
    assert!(matches!(err, ScenarioError::UnexpectedEof("invoke time")));
}

#[test]
fn malformed_token_is_reported() {
    let err = Scenario::parse("4 x 1 0 0 100 50").expect_err("bad token");
    match err {
        ScenarioError::InvalidToken { field, token } => {
            assert_eq!(field, "sdn count");
            assert_eq!(token, "x");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn node_ids_must_be_below_the_node_count() {
    let err = Scenario::parse("2 0 0 1 0 10 5 0 0 2").expect_err("out of range");
    assert!(matches!(
        err,
        ScenarioError::InvalidNode { id: NodeId(2), count: 2 }
    ));
}

#[test]
fn huge_declared_counts_fail_on_missing_tokens() {
    let err = Scenario::parse("2 0 0 1152921504606846976 0 10 5").expect_err("truncated links");
    assert!(matches!(err, ScenarioError::UnexpectedEof("link index")));

    let err = Scenario::parse("2 0 0 0 18446744073709551615 10 5").expect_err("truncated pairs");
    assert!(matches!(err, ScenarioError::UnexpectedEof("pair index")));
}

#[test]
fn node_count_must_leave_room_for_the_controller() {
    let err = Scenario::parse("4294967295 0 0 0 0 10 5").expect_err("controller id");
    assert!(matches!(err, ScenarioError::NodeCountTooLarge(u32::MAX)));

    let sc = Scenario::parse("4294967294 0 0 0 0 10 5").expect("largest node count");
    assert_eq!(sc.controller_id(), n(u32::MAX - 1));
}

#[test]
fn default_link_latency_is_one_hop() {
    assert_eq!(ScenarioOpts::default().link_latency, ONE_HOP_DELAY);
}

#[test]
fn traffic_matrix_marks_destinations_and_demands() {
    let sc = Scenario::parse(SPLIT_INPUT).expect("parse");
    let m = sc.traffic_matrix().expect("matrix");
    assert_eq!(m.nodes(), 6);
    assert!(m.is_destination(n(0)));
    assert!(!m.is_destination(n(1)));
    assert_eq!(m.volume(n(0), n(5)), 100.0);
    assert_eq!(m.demands_toward(n(0)), [(n(5), 100.0)]);
}

#[test]
fn run_reports_flood_routes_and_split_rules() {
    let sc = Scenario::parse(SPLIT_INPUT).expect("parse");
    let outcome = sc.run(&ScenarioOpts::default()).expect("run");

    assert_eq!(
        outcome.report.render(),
        "1 \n0\n0 0\n1\n0 2 50% 0 50% \n2\n0 0\n3\n0 2\n4\n0 3\n5\n0 1\n"
    );
    assert_eq!(
        outcome.report.nodes[1].routes,
        [RouteLine::Multipath {
            destination: n(0),
            paths: vec![
                WeightedHop {
                    next_hop: n(2),
                    weight: 0.5
                },
                WeightedHop {
                    next_hop: n(0),
                    weight: 0.5
                },
            ],
        }]
    );
    assert_eq!(outcome.stats.delivered_pkts, 2);
    assert!((outcome.stats.delivered_volume - 100.0).abs() < 1e-9);
    assert_eq!(outcome.live_packets, 0);
    assert_eq!(outcome.run.final_time, SimTime(400));
}

#[test]
fn unreached_destination_prints_a_dash() {
    // Node 2 is isolated, so nobody learns a route to it.
    let sc = Scenario::parse("3 0 1 1 0 100 50 2 0 0 0 0 1").expect("parse");
    let outcome = sc.run(&ScenarioOpts::default()).expect("run");
    assert_eq!(outcome.report.render(), "\n0\n2 -\n1\n2 -\n2\n2 2\n");
}

#[test]
fn duplicate_links_are_tolerated() {
    let sc = Scenario::parse("2 0 1 2 0 100 50 0 0 0 0 0 1 1 1 0").expect("parse");
    let outcome = sc.run(&ScenarioOpts::default()).expect("run");
    assert_eq!(outcome.world.net.link_count(), 2);
    assert_eq!(outcome.report.render(), "\n0\n0 0\n1\n0 0\n");
}

#[test]
fn json_scenario_round_trips() {
    let sc = Scenario::parse(SPLIT_INPUT).expect("parse");
    let raw = serde_json::to_string(&sc).expect("serialize");
    assert_eq!(Scenario::from_json(&raw).expect("from json"), sc);

    let minimal = r#"{ "node_count": 2, "end_time": 10, "invoke_time": 5 }"#;
    let sc = Scenario::from_json(minimal).expect("minimal json");
    assert!(sc.links.is_empty());
    assert!(sc.demands.is_empty());
}

#[test]
fn general_format_matches_printf_g() {
    assert_eq!(format_general(50.0), "50");
    assert_eq!(format_general(100.0 / 3.0), "33.3333");
    assert_eq!(format_general(-100.0), "-100");
    assert_eq!(format_general(0.0), "0");
    assert_eq!(format_general(0.0001), "0.0001");
    assert_eq!(format_general(1e6), "1e+06");
    assert_eq!(format_general(12345678.0), "1.23457e+07");
}
