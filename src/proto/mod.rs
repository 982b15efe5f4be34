//! 路由协议模块
//!
//! 洪泛交换机、SDN 多路径交换机和 SDN 控制器三种节点，以及它们共用的
//! 洪泛路由表和流量矩阵。

pub mod controller;
pub mod flood;
pub mod sdn_switch;
pub mod tra_switch;
pub mod traffic;

pub use controller::{SdnController, SplitPolicy, SplitRule, UnderlayView, plan_split_rules};
pub use flood::{FloodEntry, FloodTable, FloodUpdate};
pub use sdn_switch::{MultipathTable, PathEntry, SdnSwitch, Weight};
pub use tra_switch::TraSwitch;
pub use traffic::TrafficMatrix;

use crate::net::NodeRegistry;
use crate::registry::Registry;

/// 注册内置节点类型
pub fn builtin_nodes() -> NodeRegistry {
    let mut reg: NodeRegistry = Registry::new("node");
    reg.register(TraSwitch::TYPE, TraSwitch::boxed);
    reg.register(SdnSwitch::TYPE, SdnSwitch::boxed);
    reg.register(SdnController::TYPE, SdnController::boxed);
    reg
}
