//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点、链路、包头/负载/数据包、
//! 收发与生成事件，以及网络拓扑。

// 子模块声明
mod deliver_packet;
mod event_types;
mod header;
mod id;
mod link;
mod net_world;
mod network;
mod node;
mod packet;
mod packet_gen;
mod payload;
mod stats;

// 重新导出公共接口
pub use deliver_packet::{DeliverPacket, DepartPacket};
pub use event_types::{EventArgs, EventConstructor, EventRegistry, builtin_events};
pub use header::{
    Header, HeaderFields, HeaderRegistry, SdnCtrlHeader, SdnInvokeHeader, TraCtrlHeader,
    TraDataHeader, builtin_headers,
};
pub use id::{NodeId, PacketId};
pub use link::{Link, LinkEnds, LinkRegistry, ONE_HOP_DELAY, SimpleLink, builtin_links};
pub use net_world::NetWorld;
pub use network::Network;
pub use node::{Node, NodeBase, NodeRegistry};
pub use packet::{
    Packet, PacketCore, PacketFactory, PacketLedger, PacketPrototype, SdnCtrlPacket,
    SdnInvokePacket, TraCtrlPacket, TraDataPacket,
};
pub use packet_gen::{DataPacketGen, FloodPacketGen, InvokePacketGen, RulePacketGen};
pub use payload::{
    Payload, PayloadRegistry, SdnCtrlPayload, SdnInvokePayload, TraCtrlPayload, TraDataPayload,
    builtin_payloads,
};
pub use stats::Stats;
