//! SDN 多路径交换机
//!
//! 底层路由和洪泛交换机完全一样；另外维护一张多路径转发表，
//! 控制器下发的规则按比例把数据量分到多个下一跳上。

use std::any::Any;
use std::collections::BTreeMap;

use serde::Serialize;

use super::flood::{FloodTable, data_size, handle_flood};
use crate::net::{
    Network, Node, NodeBase, NodeId, Packet, SdnCtrlPacket, SdnCtrlPayload, TraCtrlPacket,
    TraDataPacket,
};
use crate::sim::Simulator;
use tracing::{debug, trace, warn};

/// 转发表项的权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Weight {
    /// 由洪泛得到、尚未被规则覆盖的默认路由
    Underlay,
    /// 控制器下发的比例
    Share(f64),
}

impl Weight {
    /// 以比例表示；默认路由为 -1
    pub fn as_fraction(self) -> f64 {
        match self {
            Weight::Underlay => -1.0,
            Weight::Share(w) => w,
        }
    }
}

/// 多路径转发表项
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathEntry {
    pub next_hop: NodeId,
    /// 底层跳数；规则表项没有
    pub hops: Option<u32>,
    pub weight: Weight,
}

/// 目的地 -> 有序的转发表项
#[derive(Debug, Clone, Default)]
pub struct MultipathTable {
    routes: BTreeMap<NodeId, Vec<PathEntry>>,
}

impl MultipathTable {
    pub fn entries(&self, dst: NodeId) -> &[PathEntry] {
        self.routes.get(&dst).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 是否已有控制器下发的规则
    pub fn has_rules(&self, dst: NodeId) -> bool {
        self.entries(dst)
            .iter()
            .any(|e| matches!(e.weight, Weight::Share(_)))
    }

    /// 底层路由变化：还没有规则时，默认表项跟随底层路由
    pub fn follow_underlay(&mut self, dst: NodeId, next_hop: NodeId, hops: u32) {
        if self.has_rules(dst) {
            return;
        }
        self.routes.insert(
            dst,
            vec![PathEntry {
                next_hop,
                hops: Some(hops),
                weight: Weight::Underlay,
            }],
        );
    }

    /// 安装一条规则：若只有默认表项，先移除它
    pub fn install_rule(&mut self, dst: NodeId, next_hop: NodeId, share: f64) {
        let entries = self.routes.entry(dst).or_default();
        if entries.first().is_some_and(|e| e.weight == Weight::Underlay) {
            entries.clear();
        }
        entries.push(PathEntry {
            next_hop,
            hops: None,
            weight: Weight::Share(share),
        });
    }

    /// 规则比例之和
    pub fn total_share(&self, dst: NodeId) -> f64 {
        self.entries(dst)
            .iter()
            .filter_map(|e| match e.weight {
                Weight::Share(w) => Some(w),
                Weight::Underlay => None,
            })
            .sum()
    }

    pub fn destinations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.routes.keys().copied()
    }
}

#[derive(Debug)]
pub struct SdnSwitch {
    base: NodeBase,
    underlay: FloodTable,
    paths: MultipathTable,
}

impl SdnSwitch {
    pub const TYPE: &'static str = "SDN_switch";

    pub fn new(id: NodeId) -> Self {
        Self {
            base: NodeBase::new(id),
            underlay: FloodTable::default(),
            paths: MultipathTable::default(),
        }
    }

    pub(crate) fn boxed(id: NodeId) -> Box<dyn Node> {
        Box::new(Self::new(id))
    }

    pub fn underlay(&self) -> &FloodTable {
        &self.underlay
    }

    pub fn paths(&self) -> &MultipathTable {
        &self.paths
    }

    fn install(&mut self, pkt: &dyn Packet) {
        let me = self.base.id();
        let pld = match pkt.payload_checked::<SdnCtrlPayload>("sdn rule") {
            Ok(pld) => pld,
            Err(err) => {
                warn!(%err, node = me.0, "规则包负载不符");
                return;
            }
        };
        self.paths.install_rule(pld.mat, pld.act, pld.per);
        debug!(
            node = me.0,
            mat = pld.mat.0,
            act = pld.act.0,
            per = pld.per,
            "📥 安装规则"
        );
    }

    /// 按表项比例把数据量分到各个下一跳
    fn forward_data(&mut self, pkt: &mut dyn Packet, sim: &mut Simulator, net: &mut Network) {
        let me = self.base.id();
        let dst = pkt.header().dst();
        let Some(size) = data_size(pkt, me) else {
            return;
        };
        if dst == me {
            net.on_consumed(me, size);
            return;
        }
        let entries = self.paths.entries(dst);
        if entries.is_empty() {
            net.on_dropped(me, dst);
            return;
        }
        for entry in entries {
            let share = match entry.weight {
                Weight::Underlay => size,
                Weight::Share(w) => w * size,
            };
            if let Some(data) = pkt.downcast_mut::<TraDataPacket>() {
                data.size = share;
            }
            let h = pkt.header_mut();
            h.set_pre(me);
            h.set_next(entry.next_hop);
            net.depart(sim, pkt);
        }
    }
}

impl Node for SdnSwitch {
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
                if let Some((dst, update)) = handle_flood(me, &mut self.underlay, pkt, sim, net) {
                    if let (true, Some(entry)) = (update.should_relay(), self.underlay.get(dst)) {
                        self.paths.follow_underlay(dst, entry.next_hop, entry.hops);
                    }
                }
            }
            SdnCtrlPacket::TYPE => self.install(pkt),
            TraDataPacket::TYPE => self.forward_data(pkt, sim, net),
            other => trace!(node = self.base.id().0, pkt_type = other, "忽略"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn underlay_next_hop(&self, dst: NodeId) -> Option<NodeId> {
        self.underlay.next_hop(dst)
    }

    fn runs_underlay(&self) -> bool {
        true
    }

    fn is_sdn_capable(&self) -> bool {
        true
    }
}
