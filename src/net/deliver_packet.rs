//! 数据包收发事件
//!
//! `recv_event`：把包交给接收节点处理；`send_event`：由发送节点把包
//! 扇出到匹配的邻居。

use super::event_types::EventArgs;
use super::id::NodeId;
use super::net_world::network_of;
use super::packet::Packet;
use crate::error::SimError;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

fn transfer_line(now: SimTime, role: &str, node: NodeId, pkt: &dyn Packet) -> String {
    let h = pkt.header();
    format!(
        "time {:>11}   {}{:>11}   pktID{:>11}   srcID{:>11}   dstID{:>11}   preID{:>11}   nexID{:>11}   {}{}",
        now.0,
        role,
        node.0,
        pkt.id(),
        h.src().0,
        h.dst().0,
        h.pre().0,
        h.next().0,
        pkt.type_name(),
        pkt.extra_info()
    )
}

/// 事件：把一个 packet 交给某个节点处理。
#[derive(Debug)]
pub struct DeliverPacket {
    pub from: NodeId,
    pub to: NodeId,
    pub pkt: Box<dyn Packet>,
}

impl DeliverPacket {
    pub const TYPE: &'static str = "recv_event";

    pub(crate) fn from_args(args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        match args {
            EventArgs::Transfer {
                sender,
                receiver,
                pkt,
            } => Ok(Box::new(DeliverPacket {
                from: sender,
                to: receiver,
                pkt,
            })),
            other => Err(other.mismatch(Self::TYPE, "transfer")),
        }
    }
}

impl Event for DeliverPacket {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.pkt.id(), to = self.to.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt, .. } = *self;
        let Some(net) = network_of(world, Self::TYPE) else {
            return;
        };
        net.deliver(sim, to, pkt);
        trace!("DeliverPacket::execute 完成");
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn identity(&self) -> String {
        format!("{}{}{}", self.from.0, self.to.0, self.pkt.id())
    }

    fn describe(&self, now: SimTime) -> String {
        transfer_line(now, "recID", self.to, &*self.pkt)
    }
}

/// 事件：发送节点把 packet 发往包头 next 字段指定的邻居（或全部邻居）。
#[derive(Debug)]
pub struct DepartPacket {
    pub from: NodeId,
    pub to: NodeId,
    pub pkt: Box<dyn Packet>,
}

impl DepartPacket {
    pub const TYPE: &'static str = "send_event";

    pub(crate) fn from_args(args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        match args {
            EventArgs::Transfer {
                sender,
                receiver,
                pkt,
            } => Ok(Box::new(DepartPacket {
                from: sender,
                to: receiver,
                pkt,
            })),
            other => Err(other.mismatch(Self::TYPE, "transfer")),
        }
    }
}

impl Event for DepartPacket {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.pkt.id(), from = self.from.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DepartPacket { from, pkt, .. } = *self;
        let Some(net) = network_of(world, Self::TYPE) else {
            return;
        };
        net.send(sim, from, pkt);
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn identity(&self) -> String {
        format!("{}{}{}", self.from.0, self.to.0, self.pkt.id())
    }

    fn describe(&self, now: SimTime) -> String {
        transfer_line(now, "senID", self.from, &*self.pkt)
    }
}
