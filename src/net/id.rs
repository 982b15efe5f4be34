//! 标识符类型
//!
//! 定义节点标识符、广播哨兵和数据包标识符。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// 广播哨兵：表示“所有当前邻居都是接收者”。包头各字段的默认值。
    pub const BROADCAST: NodeId = NodeId(u32::MAX);

    pub fn is_broadcast(self) -> bool {
        self == NodeId::BROADCAST
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 数据包标识符：首次构造时分配，复制时保留。
pub type PacketId = u64;
