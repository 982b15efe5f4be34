//! 路由表报告
//!
//! 仿真结束后每个交换机对每个目的地的路由。文本格式：第一行是 SDN id
//! 列表（每个 id 后跟一个空格），之后每个节点一行 id，再逐个目的地输出
//! 路由；没有路由时输出 `-`。

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::net::{Network, NodeId};
use crate::proto::{SdnSwitch, TraSwitch};

/// 多路径表项：下一跳和比例（默认路由为 -1）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedHop {
    pub next_hop: NodeId,
    pub weight: f64,
}

/// 某个目的地的路由
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteLine {
    Flood {
        destination: NodeId,
        next_hop: Option<NodeId>,
    },
    Multipath {
        destination: NodeId,
        paths: Vec<WeightedHop>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRoutes {
    pub id: NodeId,
    pub routes: Vec<RouteLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingReport {
    pub sdn_nodes: Vec<NodeId>,
    pub nodes: Vec<NodeRoutes>,
}

impl RoutingReport {
    /// 从网络中收集 `0..node_count` 各节点对 `destinations` 的路由
    pub fn collect(net: &Network, node_count: u32, sdn_nodes: &[NodeId], destinations: &[NodeId]) -> Self {
        let nodes = (0..node_count)
            .map(NodeId)
            .map(|id| NodeRoutes {
                id,
                routes: destinations
                    .iter()
                    .filter_map(|&dst| route_line(net, id, dst))
                    .collect(),
            })
            .collect();
        Self {
            sdn_nodes: sdn_nodes.to_vec(),
            nodes,
        }
    }

    /// 文本格式
    pub fn render(&self) -> String {
        let mut out = String::new();
        for id in &self.sdn_nodes {
            let _ = write!(out, "{id} ");
        }
        out.push('\n');
        for node in &self.nodes {
            let _ = writeln!(out, "{}", node.id);
            for route in &node.routes {
                match route {
                    RouteLine::Flood {
                        destination,
                        next_hop: Some(next),
                    } => {
                        let _ = writeln!(out, "{destination} {next}");
                    }
                    RouteLine::Multipath { destination, paths } if !paths.is_empty() => {
                        let _ = write!(out, "{destination} ");
                        for hop in paths {
                            let _ = write!(out, "{} {}% ", hop.next_hop, format_general(hop.weight * 100.0));
                        }
                        out.push('\n');
                    }
                    RouteLine::Flood { destination, .. } | RouteLine::Multipath { destination, .. } => {
                        let _ = writeln!(out, "{destination} -");
                    }
                }
            }
        }
        out
    }
}

fn route_line(net: &Network, id: NodeId, dst: NodeId) -> Option<RouteLine> {
    if let Some(sw) = net.node_as::<SdnSwitch>(id) {
        let paths = sw
            .paths()
            .entries(dst)
            .iter()
            .map(|e| WeightedHop {
                next_hop: e.next_hop,
                weight: e.weight.as_fraction(),
            })
            .collect();
        return Some(RouteLine::Multipath {
            destination: dst,
            paths,
        });
    }
    let sw = net.node_as::<TraSwitch>(id)?;
    Some(RouteLine::Flood {
        destination: dst,
        next_hop: sw.table().next_hop(dst),
    })
}

/// 最多 6 位有效数字的通用格式，去掉末尾的 0（同 C 的 `%g`）
pub fn format_general(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return v.to_string();
    }
    let sci = format!("{v:.5e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }
    let decimals = (5 - exp).max(0) as usize;
    trim_fraction(&format!("{v:.decimals$}")).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
