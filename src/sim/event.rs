//! 事件 trait
//!
//! 定义仿真事件接口以及同一时刻事件之间的确定性优先级。

use super::simulator::Simulator;
use super::time::SimTime;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);

    /// 注册表中的类型名
    fn type_name(&self) -> &'static str;

    /// 参与优先级哈希的字段，按十进制文本直接拼接（不含触发时间）。
    fn identity(&self) -> String;

    /// 事件日志的一行描述
    fn describe(&self, now: SimTime) -> String {
        format!("time {:>11}   {}", now.0, self.type_name())
    }
}

/// 同一触发时间下的优先级：对 "触发时间 + 标识字段" 的文本做 64-bit FNV-1a。
///
/// 结果只取决于时间和标识字段，跨进程稳定。
pub fn event_priority(at: SimTime, identity: &str) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    let text = format!("{}{}", at.0, identity);
    for b in text.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
