//! 事件注册表
//!
//! 事件与其它类型族一样按名字构造。构造参数是一个枚举，构造器对参数
//! 变体做检查，不匹配时返回 `ContractViolation`。

use super::deliver_packet::{DeliverPacket, DepartPacket};
use super::id::NodeId;
use super::packet::Packet;
use super::packet_gen::{DataPacketGen, FloodPacketGen, InvokePacketGen, RulePacketGen};
use crate::error::SimError;
use crate::proto::TrafficMatrix;
use crate::registry::Registry;
use crate::sim::Event;

/// 事件构造参数
#[derive(Debug)]
pub enum EventArgs {
    /// 收发事件：一跳上的发送者、接收者和独占的包
    Transfer {
        sender: NodeId,
        receiver: NodeId,
        pkt: Box<dyn Packet>,
    },
    DataGen {
        src: NodeId,
        dst: NodeId,
        size: f64,
        msg: String,
    },
    FloodGen {
        src: NodeId,
        msg: String,
    },
    RuleGen {
        controller: NodeId,
        switch: NodeId,
        mat: NodeId,
        act: NodeId,
        per: f64,
        msg: String,
    },
    InvokeGen {
        controller: NodeId,
        matrix: TrafficMatrix,
        msg: String,
    },
}

impl EventArgs {
    pub fn kind(&self) -> &'static str {
        match self {
            EventArgs::Transfer { .. } => "transfer",
            EventArgs::DataGen { .. } => "data_gen",
            EventArgs::FloodGen { .. } => "flood_gen",
            EventArgs::RuleGen { .. } => "rule_gen",
            EventArgs::InvokeGen { .. } => "invoke_gen",
        }
    }

    pub(crate) fn mismatch(&self, context: &'static str, expected: &'static str) -> SimError {
        SimError::ContractViolation {
            context,
            expected,
            found: self.kind(),
        }
    }
}

pub type EventConstructor = fn(EventArgs) -> Result<Box<dyn Event>, SimError>;
pub type EventRegistry = Registry<EventConstructor>;

/// 注册内置事件类型
pub fn builtin_events() -> EventRegistry {
    let mut reg: EventRegistry = Registry::new("event");
    reg.register(DeliverPacket::TYPE, DeliverPacket::from_args);
    reg.register(DepartPacket::TYPE, DepartPacket::from_args);
    reg.register(DataPacketGen::TYPE, DataPacketGen::from_args);
    reg.register(FloodPacketGen::TYPE, FloodPacketGen::from_args);
    reg.register(RulePacketGen::TYPE, RulePacketGen::from_args);
    reg.register(InvokePacketGen::TYPE, InvokePacketGen::from_args);
    reg
}
