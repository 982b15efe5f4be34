use crate::error::SimError;
use crate::net::{
    LinkEnds, NodeId, SimpleLink, builtin_events, builtin_headers, builtin_links, builtin_payloads,
};
use crate::proto::builtin_nodes;
use crate::registry::{Constructor, Registry};

fn seven(_: ()) -> Box<u32> {
    Box::new(7)
}

fn eight(_: ()) -> Box<u32> {
    Box::new(8)
}

#[test]
fn duplicate_registration_keeps_first_constructor() {
    let mut reg: Registry<Constructor<u32, ()>> = Registry::new("number");
    assert!(reg.register("n", seven));
    assert!(!reg.register("n", eight));
    assert_eq!(reg.len(), 1);
    assert_eq!(*reg.create("n", ()).expect("registered"), 7);
}

#[test]
fn unknown_name_is_a_lookup_failure() {
    let reg: Registry<Constructor<u32, ()>> = Registry::new("number");
    assert!(reg.create("missing", ()).is_none());
    assert_eq!(
        reg.lookup("missing").err(),
        Some(SimError::UnknownType {
            family: "number",
            name: "missing".to_string(),
        })
    );
}

#[test]
fn builtin_families_list_their_types() {
    let headers: Vec<_> = builtin_headers().names().collect();
    assert_eq!(
        headers,
        [
            "SDN_ctrl_header",
            "SDN_invoke_header",
            "TRA_ctrl_header",
            "TRA_data_header"
        ]
    );

    let nodes: Vec<_> = builtin_nodes().names().collect();
    assert_eq!(nodes, ["SDN_controller", "SDN_switch", "TRA_switch"]);

    let events = builtin_events();
    assert_eq!(events.len(), 6);
    assert!(events.contains("recv_event"));
    assert!(events.contains("send_event"));
    assert!(events.contains("SDN_invoke_pkt_gen_event"));
}

#[test]
fn payload_and_link_families_are_built_in() {
    let payloads: Vec<_> = builtin_payloads().names().collect();
    assert_eq!(
        payloads,
        [
            "SDN_ctrl_payload",
            "SDN_invoke_payload",
            "TRA_ctrl_payload",
            "TRA_data_payload"
        ]
    );

    let links: Vec<_> = builtin_links().names().collect();
    assert_eq!(links, [SimpleLink::TYPE]);
}

#[test]
fn link_constructor_uses_one_hop_delay() {
    let links = builtin_links();
    let ends = LinkEnds {
        from: NodeId(0),
        to: NodeId(1),
    };
    let link = links.create(SimpleLink::TYPE, ends).expect("simple_link");
    assert_eq!(link.ends(), ends);
    assert_eq!(link.latency(), crate::net::ONE_HOP_DELAY);
}
