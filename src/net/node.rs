//! 节点类型
//!
//! 定义网络节点接口。具体节点（洪泛交换机、多路径交换机、控制器）在
//! `proto` 中实现，并通过节点注册表按类型名构造。

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt::Debug;

use super::id::NodeId;
use super::network::Network;
use super::packet::Packet;
use crate::registry::{Constructor, Registry};
use crate::sim::Simulator;

/// 所有节点共有的状态：id 和有向的物理邻居集合
#[derive(Debug, Clone)]
pub struct NodeBase {
    id: NodeId,
    neighbors: BTreeSet<NodeId>,
}

impl NodeBase {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            neighbors: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn neighbors(&self) -> &BTreeSet<NodeId> {
        &self.neighbors
    }

    pub(crate) fn add_neighbor(&mut self, id: NodeId) -> bool {
        self.neighbors.insert(id)
    }

    pub(crate) fn remove_neighbor(&mut self, id: NodeId) -> bool {
        self.neighbors.remove(&id)
    }
}

/// 节点接口
pub trait Node: Debug + Send + Any + 'static {
    fn base(&self) -> &NodeBase;
    fn base_mut(&mut self) -> &mut NodeBase;

    /// 注册表中的类型名
    fn type_name(&self) -> &'static str;

    /// 处理到达的数据包。包只是借给处理函数，返回后由网络释放；
    /// 需要继续发送时用 `Network::depart` 复制一份。
    fn on_packet(&mut self, pkt: &mut dyn Packet, sim: &mut Simulator, net: &mut Network);

    fn as_any(&self) -> &dyn Any;

    /// 洪泛得到的（底层）下一跳；不参与洪泛的节点返回 None
    fn underlay_next_hop(&self, _dst: NodeId) -> Option<NodeId> {
        None
    }

    /// 是否维护底层路由表（交换机）
    fn runs_underlay(&self) -> bool {
        false
    }

    /// 是否接受控制器下发的规则
    fn is_sdn_capable(&self) -> bool {
        false
    }

    fn id(&self) -> NodeId {
        self.base().id()
    }

    fn neighbors(&self) -> &BTreeSet<NodeId> {
        self.base().neighbors()
    }
}

impl dyn Node {
    pub fn downcast_ref<N: Node>(&self) -> Option<&N> {
        self.as_any().downcast_ref::<N>()
    }
}

pub type NodeRegistry = Registry<Constructor<dyn Node, NodeId>>;
