//! 链路类型
//!
//! 链路是有向的 (from, to) 节点对，携带一个传播时延。

use std::fmt::Debug;

use super::id::NodeId;
use crate::registry::{Constructor, Registry};
use crate::sim::SimTime;

/// 一跳的默认时延
pub const ONE_HOP_DELAY: SimTime = SimTime(10);

/// 链路两端
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkEnds {
    pub from: NodeId,
    pub to: NodeId,
}

/// 链路接口
pub trait Link: Debug + Send {
    fn type_name(&self) -> &'static str;
    fn ends(&self) -> LinkEnds;
    fn latency(&self) -> SimTime;
}

pub type LinkRegistry = Registry<Constructor<dyn Link, LinkEnds>>;

/// 固定时延链路
#[derive(Debug, Clone)]
pub struct SimpleLink {
    ends: LinkEnds,
    latency: SimTime,
}

impl SimpleLink {
    pub const TYPE: &'static str = "simple_link";

    /// 创建新链路
    pub fn new(ends: LinkEnds, latency: SimTime) -> Self {
        Self { ends, latency }
    }

    fn boxed(ends: LinkEnds) -> Box<dyn Link> {
        Box::new(Self::new(ends, ONE_HOP_DELAY))
    }
}

impl Link for SimpleLink {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn ends(&self) -> LinkEnds {
        self.ends
    }

    fn latency(&self) -> SimTime {
        self.latency
    }
}

/// 注册内置链路类型
pub fn builtin_links() -> LinkRegistry {
    let mut reg: LinkRegistry = Registry::new("link");
    reg.register(SimpleLink::TYPE, SimpleLink::boxed);
    reg
}
