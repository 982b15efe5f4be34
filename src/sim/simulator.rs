//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::{Event, event_priority};
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use crate::error::SimError;
use std::collections::BinaryHeap;
use tracing::{debug, error, info, trace};

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// 执行过的事件数
    pub executed: u64,
    /// 超出结束时间（或致命错误后）被直接丢弃的事件数
    pub released: usize,
    pub final_time: SimTime,
}

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 调度事件在指定时间执行
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        self.schedule_boxed(at, Box::new(ev));
    }

    /// 调度一个已装箱的事件（注册表构造出的事件都走这里）
    #[tracing::instrument(skip(self, ev), fields(event_type = ev.type_name(), schedule_at = at.0))]
    pub fn schedule_boxed(&mut self, at: SimTime, ev: Box<dyn Event>) {
        let seq = self.next_seq;
        let priority = event_priority(at, &ev.identity());
        trace!(now = self.now.0, seq, priority, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            priority,
            seq,
            ev,
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
    }

    /// 运行直到事件队列为空或下一个事件晚于 `until`。
    ///
    /// 超出 `until` 的事件不会执行，直接释放。弹出的事件早于当前时钟时
    /// 返回 `OrderingViolation` 并停止运行。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> Result<RunStats, SimError> {
        let mut stats = RunStats::default();
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else { break };
            if item.at < self.now {
                let err = SimError::OrderingViolation {
                    now: self.now,
                    at: item.at,
                };
                error!(%err, "事件顺序错误，终止仿真");
                self.release_pending();
                return Err(err);
            }
            self.now = item.at;
            stats.executed += 1;
            info!(target: "sdnsim_rs::trace", "{}", item.ev.describe(self.now));
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.now = self.now.max(until);
        stats.released = self.release_pending();
        stats.final_time = self.now;
        Ok(stats)
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) -> Result<RunStats, SimError> {
        info!("▶️  开始运行仿真");
        debug!(now = self.now.0, queue_size = self.q.len(), "初始状态");

        let mut stats = RunStats::default();
        while let Some(item) = self.q.pop() {
            if item.at < self.now {
                let err = SimError::OrderingViolation {
                    now: self.now,
                    at: item.at,
                };
                error!(%err, "事件顺序错误，终止仿真");
                self.release_pending();
                return Err(err);
            }
            self.now = item.at;
            stats.executed += 1;

            debug!(
                event_num = stats.executed,
                now = self.now.0,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );
            info!(target: "sdnsim_rs::trace", "{}", item.ev.describe(self.now));

            item.ev.execute(self, world);
            world.on_tick(self);
        }
        stats.final_time = self.now;

        info!(
            total_events = stats.executed,
            final_time = self.now.0,
            "✅ 仿真完成"
        );
        Ok(stats)
    }

    fn release_pending(&mut self) -> usize {
        let n = self.q.len();
        if n > 0 {
            debug!(released = n, "释放未执行的事件");
        }
        self.q.clear();
        n
    }
}
