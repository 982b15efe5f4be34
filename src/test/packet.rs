use crate::error::SimError;
use crate::net::{
    NodeId, Packet, PacketFactory, SdnCtrlPayload, TraCtrlPacket, TraCtrlPayload, TraDataPacket,
    TraDataPayload,
};

#[test]
fn create_assigns_increasing_unique_ids() {
    let mut f = PacketFactory::default();
    let a = f.create(TraDataPacket::TYPE).expect("data packet");
    let b = f.create(TraCtrlPacket::TYPE).expect("ctrl packet");
    let c = f.create(TraDataPacket::TYPE).expect("data packet");
    assert_eq!((a.id(), b.id(), c.id()), (0, 1, 2));
    assert_eq!(f.peek_next_id(), 3);
    assert_eq!(f.live_packets(), 3);
}

#[test]
fn new_packet_header_defaults_to_broadcast() {
    let mut f = PacketFactory::default();
    let p = f.create(TraDataPacket::TYPE).expect("data packet");
    let h = p.header();
    assert!(h.src().is_broadcast());
    assert!(h.dst().is_broadcast());
    assert!(h.pre().is_broadcast());
    assert!(h.next().is_broadcast());
    assert_eq!(h.type_name(), "TRA_data_header");
    assert_eq!(p.payload().type_name(), TraDataPayload::TYPE);
}

#[test]
fn unknown_packet_type_yields_none_and_no_id() {
    let mut f = PacketFactory::default();
    assert!(f.create("no_such_packet").is_none());
    assert_eq!(f.peek_next_id(), 0);
    assert_eq!(f.live_packets(), 0);
}

#[test]
fn replicate_keeps_id_and_copies_every_field() {
    let mut f = PacketFactory::default();
    let mut p = f.create(TraDataPacket::TYPE).expect("data packet");
    p.header_mut().set_src(NodeId(1));
    p.header_mut().set_dst(NodeId(4));
    p.header_mut().set_pre(NodeId(2));
    p.header_mut().set_next(NodeId(3));
    p.payload_mut().set_msg("hello".to_string());
    p.downcast_mut::<TraDataPacket>().expect("data").size = 12.5;

    let copy = f.replicate(&*p).expect("replicate");
    assert_eq!(copy.id(), p.id());
    assert_eq!(copy.type_name(), TraDataPacket::TYPE);
    assert_eq!(copy.header().fields(), p.header().fields());
    assert_eq!(copy.payload().msg(), "hello");
    assert_eq!(copy.downcast_ref::<TraDataPacket>().expect("data").size, 12.5);
    assert_eq!(f.live_packets(), 2);

    // Replicate then drop the original: live count is unchanged.
    drop(p);
    assert_eq!(f.live_packets(), 1);
    drop(copy);
    assert_eq!(f.live_packets(), 0);
}

#[test]
fn replica_payload_is_independent() {
    let mut f = PacketFactory::default();
    let mut p = f.create(TraCtrlPacket::TYPE).expect("ctrl packet");
    p.payload_as_mut::<TraCtrlPayload>().expect("ctrl payload").counter = 3;

    let mut copy = f.replicate(&*p).expect("replicate");
    copy.payload_as_mut::<TraCtrlPayload>().expect("ctrl payload").increase();

    assert_eq!(p.payload_as::<TraCtrlPayload>().expect("payload").counter, 3);
    assert_eq!(copy.payload_as::<TraCtrlPayload>().expect("payload").counter, 4);
    assert_eq!(copy.extra_info(), " counter 4");
}

#[test]
fn payload_checked_reports_contract_violation() {
    let mut f = PacketFactory::default();
    let p = f.create(TraDataPacket::TYPE).expect("data packet");
    let err = p
        .payload_checked::<SdnCtrlPayload>("test")
        .expect_err("wrong payload type");
    match err {
        SimError::ContractViolation { context, found, .. } => {
            assert_eq!(context, "test");
            assert_eq!(found, TraDataPayload::TYPE);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn data_packet_extra_info_prints_size_with_six_decimals() {
    let mut f = PacketFactory::default();
    let mut p = f.create(TraDataPacket::TYPE).expect("data packet");
    assert_eq!(p.extra_info(), " size 1.000000");
    p.downcast_mut::<TraDataPacket>().expect("data").size = 0.5;
    assert_eq!(p.extra_info(), " size 0.500000");
}
