//! 场景
//!
//! 一个场景描述拓扑、SDN 交换机、目的地、流量需求和时间点。组装时按
//! 拓扑 -> 流量事件 -> 仿真的顺序进行：节点 `0..node_count` 为交换机，
//! 控制器 id 为 `node_count`，与所有 SDN 交换机双向相连。

mod input;
mod report;

pub use report::{NodeRoutes, RouteLine, RoutingReport, WeightedHop, format_general};

use serde::{Deserialize, Serialize};

use crate::error::{ScenarioError, SimError};
use crate::net::{NetWorld, Network, NodeId, ONE_HOP_DELAY, Stats};
use crate::proto::{SdnController, SdnSwitch, SplitPolicy, TraSwitch, TrafficMatrix};
use crate::sim::{RunStats, SimTime, Simulator};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSpec {
    pub id: NodeId,
    /// 开始洪泛的时间
    pub flood_at: SimTime,
}

/// 无向链路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: NodeId,
    pub b: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandSpec {
    pub src: NodeId,
    pub dst: NodeId,
    pub volume: f64,
    pub start: SimTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub node_count: u32,
    #[serde(default)]
    pub sdn_nodes: Vec<NodeId>,
    #[serde(default)]
    pub destinations: Vec<DestinationSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub demands: Vec<DemandSpec>,
    pub end_time: SimTime,
    pub invoke_time: SimTime,
}

/// 组装选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioOpts {
    pub link_latency: SimTime,
    pub split_policy: SplitPolicy,
}

impl Default for ScenarioOpts {
    fn default() -> Self {
        Self {
            link_latency: ONE_HOP_DELAY,
            split_policy: SplitPolicy::default(),
        }
    }
}

/// 一次运行的结果
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub report: RoutingReport,
    pub stats: Stats,
    pub run: RunStats,
    /// 运行结束后仍然存活的数据包数
    pub live_packets: i64,
    pub world: NetWorld,
}

impl Scenario {
    /// 解析文本格式
    pub fn parse(input: &str) -> Result<Self, ScenarioError> {
        let sc = input::parse_text(input)?;
        sc.validate()?;
        Ok(sc)
    }

    /// 解析 JSON 格式
    pub fn from_json(input: &str) -> Result<Self, ScenarioError> {
        let sc: Scenario = serde_json::from_str(input)?;
        sc.validate()?;
        Ok(sc)
    }

    /// 所有节点 id 都必须在 `0..node_count` 内，控制器 id 不能是广播 id
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.controller_id() == NodeId::BROADCAST {
            return Err(ScenarioError::NodeCountTooLarge(self.node_count));
        }
        let ids = self
            .sdn_nodes
            .iter()
            .copied()
            .chain(self.destinations.iter().map(|d| d.id))
            .chain(self.links.iter().flat_map(|l| [l.a, l.b]))
            .chain(self.demands.iter().flat_map(|d| [d.src, d.dst]));
        for id in ids {
            if id.0 >= self.node_count {
                return Err(ScenarioError::InvalidNode {
                    id,
                    count: self.node_count,
                });
            }
        }
        Ok(())
    }

    pub fn controller_id(&self) -> NodeId {
        NodeId(self.node_count)
    }

    pub fn destination_ids(&self) -> Vec<NodeId> {
        self.destinations.iter().map(|d| d.id).collect()
    }

    fn is_sdn(&self, id: NodeId) -> bool {
        self.sdn_nodes.contains(&id)
    }

    /// 流量矩阵：(dst, src) = volume，目的地行在哨兵列上标记
    pub fn traffic_matrix(&self) -> Result<TrafficMatrix, SimError> {
        let mut m = TrafficMatrix::new(self.node_count as usize);
        for d in &self.demands {
            m.set_demand(d.dst, d.src, d.volume)?;
        }
        for d in &self.destinations {
            m.mark_destination(d.id)?;
        }
        Ok(m)
    }

    /// 组装网络并调度初始事件
    #[tracing::instrument(skip(self, opts), fields(nodes = self.node_count))]
    pub fn install(&self, opts: &ScenarioOpts) -> Result<(Simulator, NetWorld), ScenarioError> {
        let mut sim = Simulator::default();
        let mut world = NetWorld::default();
        let net = &mut world.net;
        net.split_policy = opts.split_policy;

        for id in (0..self.node_count).map(NodeId) {
            let kind = if self.is_sdn(id) {
                SdnSwitch::TYPE
            } else {
                TraSwitch::TYPE
            };
            net.add_node(kind, id)?;
        }
        let controller = net.add_node(SdnController::TYPE, self.controller_id())?;

        for link in &self.links {
            connect_lenient(net, link.a, link.b, opts.link_latency)?;
        }
        for &sdn in &self.sdn_nodes {
            connect_lenient(net, sdn, controller, opts.link_latency)?;
        }
        info!(
            nodes = net.node_count(),
            links = net.link_count(),
            "🏗️ 拓扑已建立"
        );

        for d in &self.destinations {
            net.schedule_flood(&mut sim, d.id, d.flood_at, "")?;
        }
        net.schedule_invoke(&mut sim, controller, self.traffic_matrix()?, self.invoke_time, "")?;
        for d in &self.demands {
            net.schedule_data_packet(&mut sim, d.src, d.dst, d.volume, d.start, "")?;
        }
        Ok((sim, world))
    }

    /// 组装并运行到结束时间，收集路由报告
    pub fn run(&self, opts: &ScenarioOpts) -> Result<ScenarioOutcome, ScenarioError> {
        let (mut sim, mut world) = self.install(opts)?;
        let run = sim.run_until(self.end_time, &mut world)?;
        info!(
            executed = run.executed,
            released = run.released,
            final_time = run.final_time.0,
            "✅ 仿真完成"
        );
        let report = RoutingReport::collect(
            &world.net,
            self.node_count,
            &self.sdn_nodes,
            &self.destination_ids(),
        );
        Ok(ScenarioOutcome {
            report,
            stats: world.net.stats.clone(),
            run,
            live_packets: world.net.live_packets(),
            world,
        })
    }
}

/// 双向连接；重复链路只记录警告
fn connect_lenient(net: &mut Network, a: NodeId, b: NodeId, latency: SimTime) -> Result<(), SimError> {
    match net.connect(a, b, latency) {
        Err(err @ SimError::DuplicateLink { .. }) => {
            warn!(%err, "忽略重复链路");
            Ok(())
        }
        other => other,
    }
}
