//! 仿真核心模块
//!
//! 此模块包含离散事件仿真的核心组件：仿真时间、事件、世界和调度器。

// 子模块声明
mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

// 重新导出公共接口
pub use event::{Event, event_priority};
pub use scheduled_event::ScheduledEvent;
pub use simulator::{RunStats, Simulator};
pub use time::SimTime;
pub use world::World;
