//! 错误类型
//!
//! 仿真核心的统一错误枚举。除 `OrderingViolation` 外都是非致命错误：
//! 调用方记录日志后把当前操作当作 no-op 处理。场景输入另有 `ScenarioError`。

use crate::net::NodeId;
use crate::sim::SimTime;
use thiserror::Error;

/// 仿真错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// 注册表中没有该类型名
    #[error("no {family} type registered as `{name}`")]
    UnknownType { family: &'static str, name: String },
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("no link from {from} to {to}")]
    UnknownLink { from: NodeId, to: NodeId },
    /// 路由表中没有该目的地
    #[error("node {node} has no route toward {dst}")]
    UnknownRoute { node: NodeId, dst: NodeId },
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("link {from} -> {to} already exists")]
    DuplicateLink { from: NodeId, to: NodeId },
    /// 广播 id 不能作为节点或链路端点
    #[error("the broadcast id cannot be used here")]
    ReservedId,
    /// 弹出的事件早于当前时钟：调度逻辑缺陷，终止运行
    #[error("event scheduled at {at} popped after the clock reached {now}")]
    OrderingViolation { now: SimTime, at: SimTime },
    /// 包/头/负载与声明的类型不匹配
    #[error("{context}: expected {expected}, found {found}")]
    ContractViolation {
        context: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl SimError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::OrderingViolation { .. })
    }
}

/// 场景输入与组装错误
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario json: {0}")]
    Json(#[from] serde_json::Error),
    /// 文本输入在读完之前结束
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("invalid {field}: `{token}`")]
    InvalidToken { field: &'static str, token: String },
    /// 节点 id 超出 0..node_count
    #[error("node {id} is out of range (node count {count})")]
    InvalidNode { id: NodeId, count: u32 },
    /// 控制器 id 等于 node_count，不能落在广播 id 上
    #[error("node count {0} leaves no id for the controller")]
    NodeCountTooLarge(u32),
}
