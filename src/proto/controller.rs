//! SDN 控制器
//!
//! 控制器没有自己的路由表。收到触发包时，根据流量矩阵和各交换机的
//! 底层路由计算多路径规则，并为每条规则生成一个规则包；收到规则包时
//! 把它转发给目标交换机。
//!
//! 分流规则（每个目的地 D）：
//! 1. 沿底层路由把每个源发往 D 的流量累加到途经的每个节点上；
//! 2. 对控制器相邻的每个 SDN 交换机 A，候选下一跳从 A 的底层下一跳 P
//!    开始；A 的其它邻居 N 满足以下条件时加入候选：N 的底层下一跳不是 A，
//!    N 上没有累加流量，且 N 是 SDN 交换机时 dist(N) < dist(A)，否则
//!    dist(N) <= dist(A) + 松弛量；
//! 3. 各候选平分流量。

use std::any::Any;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::traffic::TrafficMatrix;
use crate::error::SimError;
use crate::net::{
    EventArgs, Network, Node, NodeBase, NodeId, Packet, RulePacketGen, SdnCtrlPacket,
    SdnInvokePacket, SdnInvokePayload,
};
use crate::sim::Simulator;
use tracing::{debug, info, trace, warn};

/// 分流策略参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    /// 非 SDN 邻居允许比 A 多出的跳数
    pub tra_slack: u32,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self { tra_slack: 2 }
    }
}

/// 一条待下发的规则
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitRule {
    pub switch: NodeId,
    pub destination: NodeId,
    pub next_hop: NodeId,
    pub share: f64,
}

/// 控制器计算时看到的底层网络
pub trait UnderlayView {
    /// node 的底层下一跳
    fn next_hop(&self, node: NodeId, dst: NodeId) -> Option<NodeId>;
    /// 是否维护底层路由（交换机）
    fn is_switch(&self, node: NodeId) -> bool;
    fn is_sdn(&self, node: NodeId) -> bool;
    fn neighbors(&self, node: NodeId) -> Vec<NodeId>;
}

impl UnderlayView for Network {
    fn next_hop(&self, node: NodeId, dst: NodeId) -> Option<NodeId> {
        self.node(node)?.underlay_next_hop(dst)
    }

    fn is_switch(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.runs_underlay())
    }

    fn is_sdn(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.is_sdn_capable())
    }

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| n.neighbors().iter().copied().collect())
            .unwrap_or_default()
    }
}

/// 沿底层下一跳从 from 走到 dst，依次返回经过的节点（不含 from）。
///
/// 路由缺失或出现环路时返回错误。
fn underlay_walk(view: &impl UnderlayView, from: NodeId, dst: NodeId) -> Result<Vec<NodeId>, SimError> {
    let mut hops = Vec::new();
    let mut seen = BTreeSet::from([from]);
    let mut cur = from;
    while cur != dst {
        let next = view
            .next_hop(cur, dst)
            .ok_or(SimError::UnknownRoute { node: cur, dst })?;
        if !seen.insert(next) {
            return Err(SimError::UnknownRoute { node: next, dst });
        }
        hops.push(next);
        cur = next;
    }
    Ok(hops)
}

/// 底层跳数距离；目的地自身为 0
pub fn underlay_distance(view: &impl UnderlayView, from: NodeId, dst: NodeId) -> Option<u32> {
    match underlay_walk(view, from, dst) {
        Ok(hops) => Some(hops.len() as u32),
        Err(err) => {
            warn!(%err, from = from.0, "无法计算底层距离");
            None
        }
    }
}

/// 把所有发往 dst 的流量沿底层路径累加到矩阵上
fn accumulate(matrix: &mut TrafficMatrix, view: &impl UnderlayView, dst: NodeId) {
    for (src, volume) in matrix.demands_toward(dst) {
        let hops = match underlay_walk(view, src, dst) {
            Ok(hops) => hops,
            Err(err) => {
                warn!(%err, src = src.0, "底层路径不完整，放弃累加");
                continue;
            }
        };
        for hop in hops {
            if let Err(err) = matrix.add_volume(dst, hop, volume) {
                warn!(%err, "累加流量失败");
            }
        }
    }
}

/// A 朝 dst 的候选下一跳
fn candidates(
    matrix: &TrafficMatrix,
    view: &impl UnderlayView,
    a: NodeId,
    dst: NodeId,
    policy: &SplitPolicy,
) -> Option<Vec<NodeId>> {
    let parent = match view.next_hop(a, dst) {
        Some(p) => p,
        None => {
            warn!(err = %SimError::UnknownRoute { node: a, dst }, "交换机没有底层路由");
            return None;
        }
    };
    let dist_a = underlay_distance(view, a, dst)?;
    let mut out = vec![parent];
    for n in view.neighbors(a) {
        if n == parent || !view.is_switch(n) {
            continue;
        }
        if view.next_hop(n, dst) == Some(a) || matrix.volume(dst, n) != 0.0 {
            continue;
        }
        let Some(dist_n) = underlay_distance(view, n, dst) else {
            continue;
        };
        let close_enough = if view.is_sdn(n) {
            dist_n < dist_a
        } else {
            dist_n <= dist_a.saturating_add(policy.tra_slack)
        };
        trace!(a = a.0, n = n.0, dist_a, dist_n, close_enough, "候选邻居");
        if close_enough {
            out.push(n);
        }
    }
    Some(out)
}

/// 计算分流规则。`matrix` 会被就地累加底层流量。
pub fn plan_split_rules(
    matrix: &mut TrafficMatrix,
    view: &impl UnderlayView,
    switches: &[NodeId],
    policy: &SplitPolicy,
) -> Vec<SplitRule> {
    let dsts: Vec<NodeId> = matrix.destinations().collect();
    for &dst in &dsts {
        accumulate(matrix, view, dst);
    }

    let mut rules = Vec::new();
    for &dst in &dsts {
        for &a in switches {
            if !view.is_sdn(a) {
                debug!(node = a.0, "控制器邻居不是 SDN 交换机，跳过");
                continue;
            }
            let Some(next_hops) = candidates(matrix, view, a, dst, policy) else {
                continue;
            };
            let share = 1.0 / next_hops.len() as f64;
            rules.extend(next_hops.into_iter().map(|next_hop| SplitRule {
                switch: a,
                destination: dst,
                next_hop,
                share,
            }));
        }
    }
    rules
}

#[derive(Debug)]
pub struct SdnController {
    base: NodeBase,
}

impl SdnController {
    pub const TYPE: &'static str = "SDN_controller";

    pub fn new(id: NodeId) -> Self {
        Self {
            base: NodeBase::new(id),
        }
    }

    pub(crate) fn boxed(id: NodeId) -> Box<dyn Node> {
        Box::new(Self::new(id))
    }

    fn on_invoke(&mut self, pkt: &mut dyn Packet, sim: &mut Simulator, net: &mut Network) {
        let me = self.base.id();
        let mut matrix = match pkt.payload_checked_mut::<SdnInvokePayload>("sdn invoke") {
            Ok(pld) => std::mem::take(&mut pld.matrix),
            Err(err) => {
                warn!(%err, "触发包负载不符");
                return;
            }
        };
        let switches: Vec<NodeId> = self.base.neighbors().iter().copied().collect();
        let policy = net.split_policy;
        let rules = plan_split_rules(&mut matrix, &*net, &switches, &policy);
        info!(controller = me.0, rules = rules.len(), "🧮 分流规则计算完成");

        let now = sim.now();
        for rule in rules {
            let args = EventArgs::RuleGen {
                controller: me,
                switch: rule.switch,
                mat: rule.destination,
                act: rule.next_hop,
                per: rule.share,
                msg: String::new(),
            };
            if let Err(err) = net.emit(sim, now, RulePacketGen::TYPE, args) {
                warn!(%err, "无法调度规则生成事件");
            }
        }
    }
}

impl Node for SdnController {
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
            SdnCtrlPacket::TYPE => {
                let target = pkt.header().dst();
                let h = pkt.header_mut();
                h.set_pre(self.base.id());
                h.set_next(target);
                net.depart(sim, pkt);
            }
            SdnInvokePacket::TYPE => self.on_invoke(pkt, sim, net),
            other => trace!(pkt_type = other, "控制器忽略"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
