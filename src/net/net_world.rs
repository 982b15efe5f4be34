//! 网络世界实现
//!
//! 定义网络仿真的世界（World）实现，持有网络拓扑。

use super::network::Network;
use crate::sim::World;
use std::any::Any;
use tracing::error;

/// 一个默认的网络世界实现：持有 Network。
#[derive(Debug, Default)]
pub struct NetWorld {
    pub net: Network,
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 从通用世界里取出网络；世界类型不对时记录错误并返回 None。
pub(crate) fn network_of<'w>(world: &'w mut dyn World, context: &'static str) -> Option<&'w mut Network> {
    match world.as_any_mut().downcast_mut::<NetWorld>() {
        Some(w) => Some(&mut w.net),
        None => {
            error!(context, "world must be NetWorld");
            None
        }
    }
}
