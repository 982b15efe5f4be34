//! 洪泛交换机
//!
//! 只运行洪泛协议，每个目的地一条下一跳。

use std::any::Any;

use super::flood::{FloodTable, data_size, handle_flood};
use crate::net::{Network, Node, NodeBase, NodeId, Packet, TraCtrlPacket, TraDataPacket};
use crate::sim::Simulator;
use tracing::trace;

#[derive(Debug)]
pub struct TraSwitch {
    base: NodeBase,
    table: FloodTable,
}

impl TraSwitch {
    pub const TYPE: &'static str = "TRA_switch";

    pub fn new(id: NodeId) -> Self {
        Self {
            base: NodeBase::new(id),
            table: FloodTable::default(),
        }
    }

    pub(crate) fn boxed(id: NodeId) -> Box<dyn Node> {
        Box::new(Self::new(id))
    }

    pub fn table(&self) -> &FloodTable {
        &self.table
    }

    /// 转发数据包：发给自己的包被消费，未知目的地的包被丢弃
    fn forward_data(&mut self, pkt: &mut dyn Packet, sim: &mut Simulator, net: &mut Network) {
        let me = self.base.id();
        let dst = pkt.header().dst();
        if dst == me {
            if let Some(size) = data_size(pkt, me) {
                net.on_consumed(me, size);
            }
            return;
        }
        let Some(next) = self.table.next_hop(dst) else {
            net.on_dropped(me, dst);
            return;
        };
        let h = pkt.header_mut();
        h.set_pre(me);
        h.set_next(next);
        net.depart(sim, pkt);
    }
}

impl Node for TraSwitch {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn on_packet(&mut self, pkt: &mut dyn Packet, sim: &mut Simulator, net: &mut Network) {
        match pkt.type_name() {
            TraCtrlPacket::TYPE => {
                let me = self.base.id();
                handle_flood(me, &mut self.table, pkt, sim, net);
            }
            TraDataPacket::TYPE => self.forward_data(pkt, sim, net),
            other => trace!(node = self.base.id().0, pkt_type = other, "忽略"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn underlay_next_hop(&self, dst: NodeId) -> Option<NodeId> {
        self.table.next_hop(dst)
    }

    fn runs_underlay(&self) -> bool {
        true
    }
}
