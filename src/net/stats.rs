//! 统计信息
//!
//! 定义网络仿真统计数据结构。

/// 网络统计信息
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stats {
    /// 到达目的地并被消费的数据包数
    pub delivered_pkts: u64,
    /// 到达目的地的数据量之和
    pub delivered_volume: f64,
    /// 因为没有路由而丢弃的数据包数
    pub dropped_pkts: u64,
}
