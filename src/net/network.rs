//! 网络拓扑管理
//!
//! 定义网络拓扑结构：节点表、链路表、各类型注册表，以及数据包的
//! 发送/交付/转发流水线和统计信息。

use std::collections::BTreeMap;

use super::deliver_packet::{DeliverPacket, DepartPacket};
use super::event_types::{EventArgs, EventConstructor, EventRegistry, builtin_events};
use super::id::NodeId;
use super::link::{Link, LinkEnds, LinkRegistry, SimpleLink, builtin_links};
use super::node::{Node, NodeRegistry};
use super::packet::{Packet, PacketFactory};
use super::packet_gen::{DataPacketGen, FloodPacketGen, InvokePacketGen, RulePacketGen};
use super::stats::Stats;
use crate::error::SimError;
use crate::proto::{SplitPolicy, TrafficMatrix, builtin_nodes};
use crate::registry::Constructor;
use crate::sim::{Event, SimTime, Simulator};
use tracing::{debug, info, trace, warn};

/// 网络拓扑
#[derive(Debug)]
pub struct Network {
    nodes: BTreeMap<NodeId, Box<dyn Node>>,
    links: BTreeMap<(NodeId, NodeId), Box<dyn Link>>,
    node_types: NodeRegistry,
    link_types: LinkRegistry,
    events: EventRegistry,
    packets: PacketFactory,
    pub split_policy: SplitPolicy,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            node_types: builtin_nodes(),
            link_types: builtin_links(),
            events: builtin_events(),
            packets: PacketFactory::default(),
            split_policy: SplitPolicy::default(),
            stats: Stats::default(),
        }
    }
}

impl Network {
    /// 注册节点类型
    pub fn register_node_type(&mut self, name: &'static str, ctor: Constructor<dyn Node, NodeId>) -> bool {
        self.node_types.register(name, ctor)
    }

    /// 注册链路类型
    pub fn register_link_type(&mut self, name: &'static str, ctor: Constructor<dyn Link, LinkEnds>) -> bool {
        self.link_types.register(name, ctor)
    }

    /// 注册事件类型
    pub fn register_event_type(&mut self, name: &'static str, ctor: EventConstructor) -> bool {
        self.events.register(name, ctor)
    }

    pub fn node_types(&self) -> &NodeRegistry {
        &self.node_types
    }

    pub fn link_types(&self) -> &LinkRegistry {
        &self.link_types
    }

    pub fn event_types(&self) -> &EventRegistry {
        &self.events
    }

    pub fn packets(&self) -> &PacketFactory {
        &self.packets
    }

    pub fn packets_mut(&mut self) -> &mut PacketFactory {
        &mut self.packets
    }

    /// 当前存活的数据包数（含事件队列中持有的包）
    pub fn live_packets(&self) -> i64 {
        self.packets.live_packets()
    }

    /// 按类型名添加节点
    #[tracing::instrument(skip(self), fields(id = id.0))]
    pub fn add_node(&mut self, type_name: &str, id: NodeId) -> Result<NodeId, SimError> {
        if id.is_broadcast() {
            return Err(SimError::ReservedId);
        }
        if self.nodes.contains_key(&id) {
            return Err(SimError::DuplicateNode(id));
        }
        let ctor = self.node_types.lookup(type_name)?;
        self.nodes.insert(id, ctor(id));
        debug!(node_type = type_name, "添加节点");
        Ok(id)
    }

    /// 删除节点及其所有出入链路
    pub fn remove_node(&mut self, id: NodeId) -> Result<Box<dyn Node>, SimError> {
        let node = self.nodes.remove(&id).ok_or(SimError::UnknownNode(id))?;
        self.links.retain(|&(from, to), _| from != id && to != id);
        for other in self.nodes.values_mut() {
            other.base_mut().remove_neighbor(id);
        }
        debug!(id = id.0, "删除节点");
        Ok(node)
    }

    /// 添加一条有向物理链路 from -> to（按类型名构造链路）。
    ///
    /// 自环直接忽略。
    pub fn add_phy_neighbor(&mut self, from: NodeId, to: NodeId, link_type: &str) -> Result<(), SimError> {
        let ctor = self.link_types.lookup(link_type)?;
        let link = ctor(LinkEnds { from, to });
        self.add_phy_neighbor_with(from, to, link)
    }

    /// 添加一条有向物理链路，链路实例由调用方给出
    pub fn add_phy_neighbor_with(
        &mut self,
        from: NodeId,
        to: NodeId,
        link: Box<dyn Link>,
    ) -> Result<(), SimError> {
        if from == to {
            debug!(id = from.0, "忽略自环链路");
            return Ok(());
        }
        if from.is_broadcast() || to.is_broadcast() {
            return Err(SimError::ReservedId);
        }
        if !self.nodes.contains_key(&to) {
            return Err(SimError::UnknownNode(to));
        }
        let node = self.nodes.get_mut(&from).ok_or(SimError::UnknownNode(from))?;
        if self.links.contains_key(&(from, to)) || !node.base_mut().add_neighbor(to) {
            return Err(SimError::DuplicateLink { from, to });
        }
        trace!(from = from.0, to = to.0, latency = link.latency().0, "添加链路");
        self.links.insert((from, to), link);
        Ok(())
    }

    /// 删除有向链路 from -> to
    pub fn remove_phy_neighbor(&mut self, from: NodeId, to: NodeId) -> Result<Box<dyn Link>, SimError> {
        let node = self.nodes.get_mut(&from).ok_or(SimError::UnknownNode(from))?;
        node.base_mut().remove_neighbor(to);
        self.links
            .remove(&(from, to))
            .ok_or(SimError::UnknownLink { from, to })
    }

    /// 双向连接两个节点（固定时延链路）
    pub fn connect(&mut self, a: NodeId, b: NodeId, latency: SimTime) -> Result<(), SimError> {
        self.add_phy_neighbor_with(a, b, Box::new(SimpleLink::new(LinkEnds { from: a, to: b }, latency)))?;
        self.add_phy_neighbor_with(b, a, Box::new(SimpleLink::new(LinkEnds { from: b, to: a }, latency)))
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(&id).map(|n| &**n)
    }

    /// 按具体类型取节点
    pub fn node_as<N: Node>(&self, id: NodeId) -> Option<&N> {
        self.node(id)?.downcast_ref::<N>()
    }

    pub fn link(&self, from: NodeId, to: NodeId) -> Option<&dyn Link> {
        self.links.get(&(from, to)).map(|l| &**l)
    }

    /// 所有节点 id（升序）
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// 按名字构造事件
    pub fn create_event(&self, name: &str, args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        let ctor = self.events.lookup(name)?;
        ctor(args)
    }

    /// 按名字构造事件并调度到 `at`
    pub fn emit(&self, sim: &mut Simulator, at: SimTime, name: &str, args: EventArgs) -> Result<(), SimError> {
        let ev = self.create_event(name, args)?;
        sim.schedule_boxed(at, ev);
        Ok(())
    }

    /// 把数据包交给节点处理；处理完毕后释放数据包
    #[tracing::instrument(skip(self, sim, pkt), fields(pkt_id = pkt.id(), to = to.0))]
    pub fn deliver(&mut self, sim: &mut Simulator, to: NodeId, mut pkt: Box<dyn Packet>) {
        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let Some(mut node) = self.nodes.remove(&to) else {
            warn!(err = %SimError::UnknownNode(to), "📭 接收节点不存在，丢弃数据包");
            return;
        };
        trace!(node_type = node.type_name(), "取出节点");

        node.on_packet(&mut *pkt, sim, self);

        trace!("节点处理完成，放回节点");
        self.nodes.insert(to, node);
    }

    /// 从 `from` 发出数据包：对每个匹配 next 字段（或广播时的全部）邻居，
    /// 按链路时延调度一个携带独立副本的接收事件。原包在此释放。
    #[tracing::instrument(skip(self, sim, pkt), fields(pkt_id = pkt.id(), from = from.0))]
    pub fn send(&mut self, sim: &mut Simulator, from: NodeId, pkt: Box<dyn Packet>) {
        let Some(node) = self.nodes.get(&from) else {
            warn!(err = %SimError::UnknownNode(from), "发送节点不存在，丢弃数据包");
            return;
        };
        let next = pkt.header().next();
        let mut targets = Vec::new();
        for &to in node.neighbors() {
            if !next.is_broadcast() && to != next {
                continue;
            }
            match self.links.get(&(from, to)) {
                Some(link) => targets.push((to, link.latency())),
                None => warn!(err = %SimError::UnknownLink { from, to }, "跳过缺失的链路"),
            }
        }
        if targets.is_empty() {
            debug!(next = next.0, "没有匹配的邻居");
        }

        let now = sim.now();
        for (to, latency) in targets {
            let Some(copy) = self.packets.replicate(&*pkt) else {
                continue;
            };
            let arrive = now.after(latency);
            trace!(to = to.0, arrive = arrive.0, "🚀 调度接收事件");
            let args = EventArgs::Transfer {
                sender: from,
                receiver: to,
                pkt: copy,
            };
            if let Err(err) = self.emit(sim, arrive, DeliverPacket::TYPE, args) {
                warn!(%err, "无法调度接收事件");
            }
        }
    }

    /// 处理函数请求再发送一份：复制数据包，以包头 pre 字段为发送节点调度发送事件。
    pub fn depart(&mut self, sim: &mut Simulator, pkt: &dyn Packet) {
        let Some(copy) = self.packets.replicate(pkt) else {
            return;
        };
        let sender = pkt.header().pre();
        let receiver = pkt.header().next();
        let args = EventArgs::Transfer {
            sender,
            receiver,
            pkt: copy,
        };
        let now = sim.now();
        if let Err(err) = self.emit(sim, now, DepartPacket::TYPE, args) {
            warn!(%err, "无法调度发送事件");
        }
    }

    /// 生成的数据包先交给生成节点自己处理（当前时刻的自投递）
    pub(crate) fn self_deliver(&mut self, sim: &mut Simulator, node: NodeId, pkt: Box<dyn Packet>) {
        let args = EventArgs::Transfer {
            sender: node,
            receiver: node,
            pkt,
        };
        let now = sim.now();
        if let Err(err) = self.emit(sim, now, DeliverPacket::TYPE, args) {
            warn!(%err, "无法调度自投递事件");
        }
    }

    /// 数据包送达目的地
    pub(crate) fn on_consumed(&mut self, at: NodeId, size: f64) {
        self.stats.delivered_pkts += 1;
        self.stats.delivered_volume += size;
        debug!(
            at = at.0,
            size,
            delivered_pkts = self.stats.delivered_pkts,
            "✅ 数据包送达目的地"
        );
    }

    /// 没有路由，数据包被丢弃
    pub(crate) fn on_dropped(&mut self, at: NodeId, dst: NodeId) {
        self.stats.dropped_pkts += 1;
        debug!(err = %SimError::UnknownRoute { node: at, dst }, "🗑️ 丢弃数据包");
    }

    fn require_node(&self, id: NodeId) -> Result<(), SimError> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(SimError::UnknownNode(id))
        }
    }

    /// 在 `at` 时刻由 src 生成一个发往 dst 的数据包
    pub fn schedule_data_packet(
        &self,
        sim: &mut Simulator,
        src: NodeId,
        dst: NodeId,
        size: f64,
        at: SimTime,
        msg: impl Into<String>,
    ) -> Result<(), SimError> {
        self.require_node(src)?;
        self.require_node(dst)?;
        let args = EventArgs::DataGen {
            src,
            dst,
            size,
            msg: msg.into(),
        };
        self.emit(sim, at, DataPacketGen::TYPE, args)
    }

    /// 在 `at` 时刻由 src 开始洪泛
    pub fn schedule_flood(
        &self,
        sim: &mut Simulator,
        src: NodeId,
        at: SimTime,
        msg: impl Into<String>,
    ) -> Result<(), SimError> {
        self.require_node(src)?;
        info!(src = src.0, at = at.0, "调度洪泛");
        self.emit(sim, at, FloodPacketGen::TYPE, EventArgs::FloodGen { src, msg: msg.into() })
    }

    /// 在 `at` 时刻把流量矩阵交给控制器
    pub fn schedule_invoke(
        &self,
        sim: &mut Simulator,
        controller: NodeId,
        matrix: TrafficMatrix,
        at: SimTime,
        msg: impl Into<String>,
    ) -> Result<(), SimError> {
        self.require_node(controller)?;
        let args = EventArgs::InvokeGen {
            controller,
            matrix,
            msg: msg.into(),
        };
        self.emit(sim, at, InvokePacketGen::TYPE, args)
    }

    /// 在 `at` 时刻由控制器向 switch 下发一条规则 (mat -> act, per)
    #[allow(clippy::too_many_arguments)]
    pub fn schedule_rule(
        &self,
        sim: &mut Simulator,
        controller: NodeId,
        switch: NodeId,
        mat: NodeId,
        act: NodeId,
        per: f64,
        at: SimTime,
        msg: impl Into<String>,
    ) -> Result<(), SimError> {
        self.require_node(controller)?;
        self.require_node(switch)?;
        let args = EventArgs::RuleGen {
            controller,
            switch,
            mat,
            act,
            per,
            msg: msg.into(),
        };
        self.emit(sim, at, RulePacketGen::TYPE, args)
    }
}
