//! 文本场景输入
//!
//! 空白分隔的整数/浮点数序列，顺序：
//! `node sdn dst links pairs end_time invoke_time`，SDN id 列表，
//! 目的地 id 列表，每个目的地一对 `<id> <flood_time>`（id 被忽略），
//! 每条链路 `<index> <a> <b>`，每个流量 `<index> <src> <dst> <volume> <start>`。

use std::str::{FromStr, SplitWhitespace};

use super::{DemandSpec, DestinationSpec, LinkSpec, Scenario};
use crate::error::ScenarioError;
use crate::net::NodeId;
use crate::sim::SimTime;

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            inner: input.split_whitespace(),
        }
    }

    fn next<T: FromStr>(&mut self, field: &'static str) -> Result<T, ScenarioError> {
        let token = self.inner.next().ok_or(ScenarioError::UnexpectedEof(field))?;
        token.parse().map_err(|_| ScenarioError::InvalidToken {
            field,
            token: token.to_string(),
        })
    }

    fn node(&mut self, field: &'static str) -> Result<NodeId, ScenarioError> {
        self.next::<u32>(field).map(NodeId)
    }

    fn time(&mut self, field: &'static str) -> Result<SimTime, ScenarioError> {
        self.next::<u64>(field).map(SimTime)
    }
}

pub(super) fn parse_text(input: &str) -> Result<Scenario, ScenarioError> {
    let mut t = Tokens::new(input);
    let node_count: u32 = t.next("node count")?;
    let sdn_count: usize = t.next("sdn count")?;
    let dst_count: usize = t.next("destination count")?;
    let link_count: usize = t.next("link count")?;
    let pair_count: usize = t.next("pair count")?;
    let end_time = t.time("end time")?;
    let invoke_time = t.time("invoke time")?;

    let sdn_nodes = (0..sdn_count)
        .map(|_| t.node("sdn id"))
        .collect::<Result<Vec<_>, _>>()?;
    let dst_ids = (0..dst_count)
        .map(|_| t.node("destination id"))
        .collect::<Result<Vec<_>, _>>()?;
    let mut destinations = Vec::new();
    for id in dst_ids {
        let _ignored: u32 = t.next("flood entry id")?;
        destinations.push(DestinationSpec {
            id,
            flood_at: t.time("flood time")?,
        });
    }

    let mut links = Vec::new();
    for _ in 0..link_count {
        let _index: u64 = t.next("link index")?;
        links.push(LinkSpec {
            a: t.node("link endpoint")?,
            b: t.node("link endpoint")?,
        });
    }

    let mut demands = Vec::new();
    for _ in 0..pair_count {
        let _index: u64 = t.next("pair index")?;
        demands.push(DemandSpec {
            src: t.node("pair source")?,
            dst: t.node("pair destination")?,
            volume: t.next("pair volume")?,
            start: t.time("pair start time")?,
        });
    }

    Ok(Scenario {
        node_count,
        sdn_nodes,
        destinations,
        links,
        demands,
        end_time,
        invoke_time,
    })
}
