//! 洪泛路由
//!
//! 每个目的地只保留一条最优路由：跳数严格更小时替换；跳数相同且
//! 候选下一跳 id 更小时只替换下一跳；其余情况视为过期，不再转发。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::net::{Network, NodeId, Packet, TraCtrlPayload, TraDataPacket};
use crate::sim::Simulator;
use tracing::{trace, warn};

/// 一条洪泛路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloodEntry {
    pub next_hop: NodeId,
    pub hops: u32,
}

/// 一次洪泛更新的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodUpdate {
    /// 新的目的地
    Installed,
    /// 跳数更小
    Improved,
    /// 跳数相同，下一跳 id 更小
    TieBroken,
    /// 没有变化
    Stale,
}

impl FloodUpdate {
    pub fn should_relay(self) -> bool {
        self != FloodUpdate::Stale
    }
}

/// 目的地 -> 最优 (下一跳, 跳数)
#[derive(Debug, Clone, Default)]
pub struct FloodTable {
    routes: BTreeMap<NodeId, FloodEntry>,
}

impl FloodTable {
    /// 收到一次洪泛通告：经 `next_hop` 可在 `hops` 跳内到达 `dst`
    pub fn offer(&mut self, dst: NodeId, next_hop: NodeId, hops: u32) -> FloodUpdate {
        match self.routes.get_mut(&dst) {
            None => {
                self.routes.insert(dst, FloodEntry { next_hop, hops });
                FloodUpdate::Installed
            }
            Some(entry) if hops < entry.hops => {
                *entry = FloodEntry { next_hop, hops };
                FloodUpdate::Improved
            }
            Some(entry) if hops == entry.hops && next_hop < entry.next_hop => {
                entry.next_hop = next_hop;
                FloodUpdate::TieBroken
            }
            Some(_) => FloodUpdate::Stale,
        }
    }

    pub fn get(&self, dst: NodeId) -> Option<&FloodEntry> {
        self.routes.get(&dst)
    }

    pub fn next_hop(&self, dst: NodeId) -> Option<NodeId> {
        self.routes.get(&dst).map(|e| e.next_hop)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &FloodEntry)> {
        self.routes.iter().map(|(d, e)| (*d, e))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// 处理洪泛控制包：更新路由表，有变化时计数加一并向所有邻居转发。
///
/// 返回本次更新的结果；负载类型不符时返回 None。
pub(crate) fn handle_flood(
    me: NodeId,
    table: &mut FloodTable,
    pkt: &mut dyn Packet,
    sim: &mut Simulator,
    net: &mut Network,
) -> Option<(NodeId, FloodUpdate)> {
    let (dst, pre) = (pkt.header().src(), pkt.header().pre());
    let pld = match pkt.payload_checked_mut::<TraCtrlPayload>("flood") {
        Ok(pld) => pld,
        Err(err) => {
            warn!(%err, node = me.0, "洪泛包负载不符");
            return None;
        }
    };
    let update = table.offer(dst, pre, pld.counter);
    trace!(node = me.0, dst = dst.0, via = pre.0, hops = pld.counter, ?update, "洪泛更新");
    if !update.should_relay() {
        return Some((dst, update));
    }
    pld.increase();

    let h = pkt.header_mut();
    h.set_pre(me);
    h.set_next(NodeId::BROADCAST);
    h.set_dst(NodeId::BROADCAST);
    net.depart(sim, pkt);
    Some((dst, update))
}

/// 读取数据包的数据量；类型不符时记录日志
pub(crate) fn data_size(pkt: &dyn Packet, node: NodeId) -> Option<f64> {
    match pkt.downcast_ref::<TraDataPacket>() {
        Some(data) => Some(data.size),
        None => {
            warn!(node = node.0, found = pkt.type_name(), "数据包类型不符");
            None
        }
    }
}
