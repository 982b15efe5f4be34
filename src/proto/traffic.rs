//! 流量矩阵
//!
//! 行是目的地，列是源；额外的最后一列是哨兵列，值为 1 表示该行是
//! 一个活跃的目的地。

use serde::Serialize;

use crate::error::SimError;
use crate::net::NodeId;

/// 目的地 × 源 的流量表（外加一列目的地标记）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficMatrix {
    nodes: usize,
    cells: Vec<Vec<f64>>,
}

impl TrafficMatrix {
    /// `nodes × (nodes + 1)` 的全零矩阵
    pub fn new(nodes: usize) -> Self {
        Self {
            nodes,
            cells: vec![vec![0.0; nodes + 1]; nodes],
        }
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    fn index(&self, id: NodeId) -> Result<usize, SimError> {
        let i = id.0 as usize;
        if id.is_broadcast() || i >= self.nodes {
            return Err(SimError::UnknownNode(id));
        }
        Ok(i)
    }

    /// 设置 src 发往 dst 的流量
    pub fn set_demand(&mut self, dst: NodeId, src: NodeId, volume: f64) -> Result<(), SimError> {
        let (d, s) = (self.index(dst)?, self.index(src)?);
        self.cells[d][s] = volume;
        Ok(())
    }

    /// 在哨兵列上把 dst 标记为目的地
    pub fn mark_destination(&mut self, dst: NodeId) -> Result<(), SimError> {
        let d = self.index(dst)?;
        let sentinel = self.nodes;
        self.cells[d][sentinel] = 1.0;
        Ok(())
    }

    pub fn is_destination(&self, dst: NodeId) -> bool {
        self.index(dst)
            .map(|d| self.cells[d][self.nodes] == 1.0)
            .unwrap_or(false)
    }

    /// 单元格 (dst, col) 的值；越界视为 0
    pub fn volume(&self, dst: NodeId, col: NodeId) -> f64 {
        match (self.index(dst), self.index(col)) {
            (Ok(d), Ok(c)) => self.cells[d][c],
            _ => 0.0,
        }
    }

    /// 在单元格 (dst, col) 上累加流量
    pub fn add_volume(&mut self, dst: NodeId, col: NodeId, volume: f64) -> Result<(), SimError> {
        let (d, c) = (self.index(dst)?, self.index(col)?);
        self.cells[d][c] += volume;
        Ok(())
    }

    /// 所有被标记的目的地（升序）
    pub fn destinations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, row)| row.last() == Some(&1.0))
            .map(|(d, _)| NodeId(d as u32))
    }

    /// 发往 dst 的非零 (源, 流量) 对
    pub fn demands_toward(&self, dst: NodeId) -> Vec<(NodeId, f64)> {
        let Ok(d) = self.index(dst) else {
            return Vec::new();
        };
        self.cells[d][..self.nodes]
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(|(s, v)| (NodeId(s as u32), *v))
            .collect()
    }
}
