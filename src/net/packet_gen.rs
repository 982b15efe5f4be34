//! 数据包生成事件
//!
//! 每个数据包家族各有一个生成事件：从零构造数据包，填写包头，然后
//! 在当前时刻自投递给生成节点，由它的接收处理函数统一接手。

use super::event_types::EventArgs;
use super::id::NodeId;
use super::net_world::network_of;
use super::network::Network;
use super::packet::{Packet, SdnCtrlPacket, SdnInvokePacket, TraCtrlPacket, TraDataPacket};
use super::payload::{Payload, SdnCtrlPayload, SdnInvokePayload, TraCtrlPayload, TraDataPayload};
use crate::error::SimError;
use crate::proto::TrafficMatrix;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::warn;

/// 构造一个包并填写包头：pre 和 next 都指向生成节点自己
fn stamp(net: &mut Network, type_name: &'static str, src: NodeId, dst: NodeId) -> Option<Box<dyn Packet>> {
    let mut pkt = net.packets_mut().create(type_name)?;
    if pkt.type_name() != type_name {
        let err = SimError::ContractViolation {
            context: "packet generation",
            expected: type_name,
            found: pkt.type_name(),
        };
        warn!(%err, "数据包类型不符");
        return None;
    }
    let h = pkt.header_mut();
    h.set_src(src);
    h.set_dst(dst);
    h.set_pre(src);
    h.set_next(src);
    Some(pkt)
}

/// 填写负载；负载类型不符时记录日志并放弃这个包
fn fill_payload<P: Payload>(
    pkt: &mut Box<dyn Packet>,
    context: &'static str,
    fill: impl FnOnce(&mut P),
) -> bool {
    match pkt.payload_checked_mut::<P>(context) {
        Ok(pld) => {
            fill(pld);
            true
        }
        Err(err) => {
            warn!(%err, "负载类型不符，放弃生成");
            false
        }
    }
}

fn gen_line(now: SimTime, src: NodeId, dst: NodeId, kind: &str) -> String {
    format!(
        "time {:>11}   srcID{:>11}   dstID{:>11}   {}",
        now.0, src.0, dst.0, kind
    )
}

/// 生成数据包
#[derive(Debug)]
pub struct DataPacketGen {
    pub src: NodeId,
    pub dst: NodeId,
    pub size: f64,
    pub msg: String,
}

impl DataPacketGen {
    pub const TYPE: &'static str = "TRA_data_pkt_gen_event";

    pub(crate) fn from_args(args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        match args {
            EventArgs::DataGen { src, dst, size, msg } => Ok(Box::new(Self { src, dst, size, msg })),
            other => Err(other.mismatch(Self::TYPE, "data_gen")),
        }
    }
}

impl Event for DataPacketGen {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(net) = network_of(world, Self::TYPE) else {
            return;
        };
        let Some(mut pkt) = stamp(net, TraDataPacket::TYPE, self.src, self.dst) else {
            return;
        };
        let Self { src, size, msg, .. } = *self;
        if !fill_payload::<TraDataPayload>(&mut pkt, Self::TYPE, |pld| pld.msg = msg) {
            return;
        }
        match pkt.downcast_mut::<TraDataPacket>() {
            Some(data) => data.size = size,
            None => return,
        }
        net.self_deliver(sim, src, pkt);
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn identity(&self) -> String {
        format!("{}{}", self.src.0, self.dst.0)
    }

    fn describe(&self, now: SimTime) -> String {
        gen_line(now, self.src, self.dst, Self::TYPE)
    }
}

/// 生成洪泛控制包：目的地为广播，计数器从 0 开始
#[derive(Debug)]
pub struct FloodPacketGen {
    pub src: NodeId,
    pub msg: String,
}

impl FloodPacketGen {
    pub const TYPE: &'static str = "TRA_ctrl_pkt_gen_event";

    pub(crate) fn from_args(args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        match args {
            EventArgs::FloodGen { src, msg } => Ok(Box::new(Self { src, msg })),
            other => Err(other.mismatch(Self::TYPE, "flood_gen")),
        }
    }
}

impl Event for FloodPacketGen {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(net) = network_of(world, Self::TYPE) else {
            return;
        };
        let Some(mut pkt) = stamp(net, TraCtrlPacket::TYPE, self.src, NodeId::BROADCAST) else {
            return;
        };
        let Self { src, msg } = *self;
        if fill_payload::<TraCtrlPayload>(&mut pkt, Self::TYPE, |pld| {
            pld.msg = msg;
            pld.counter = 0;
        }) {
            net.self_deliver(sim, src, pkt);
        }
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn identity(&self) -> String {
        format!("{}{}", self.src.0, NodeId::BROADCAST.0)
    }

    fn describe(&self, now: SimTime) -> String {
        gen_line(now, self.src, NodeId::BROADCAST, Self::TYPE)
    }
}

/// 生成规则包：由控制器发出，目的地为目标交换机
#[derive(Debug)]
pub struct RulePacketGen {
    pub controller: NodeId,
    pub switch: NodeId,
    pub mat: NodeId,
    pub act: NodeId,
    pub per: f64,
    pub msg: String,
}

impl RulePacketGen {
    pub const TYPE: &'static str = "SDN_ctrl_pkt_gen_event";

    pub(crate) fn from_args(args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        match args {
            EventArgs::RuleGen {
                controller,
                switch,
                mat,
                act,
                per,
                msg,
            } => Ok(Box::new(Self {
                controller,
                switch,
                mat,
                act,
                per,
                msg,
            })),
            other => Err(other.mismatch(Self::TYPE, "rule_gen")),
        }
    }
}

impl Event for RulePacketGen {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(net) = network_of(world, Self::TYPE) else {
            return;
        };
        let Some(mut pkt) = stamp(net, SdnCtrlPacket::TYPE, self.controller, self.switch) else {
            return;
        };
        let Self {
            controller,
            mat,
            act,
            per,
            msg,
            ..
        } = *self;
        if fill_payload::<SdnCtrlPayload>(&mut pkt, Self::TYPE, |pld| {
            pld.msg = msg;
            pld.mat = mat;
            pld.act = act;
            pld.per = per;
        }) {
            net.self_deliver(sim, controller, pkt);
        }
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn identity(&self) -> String {
        format!(
            "{}{}{}{}",
            self.controller.0, self.switch.0, self.mat.0, self.act.0
        )
    }

    fn describe(&self, now: SimTime) -> String {
        format!(
            "{}   mat{:>11}   act{:>11}   per {:.6}",
            gen_line(now, self.controller, self.switch, Self::TYPE),
            self.mat.0,
            self.act.0,
            self.per
        )
    }
}

/// 生成触发包：把流量矩阵交给控制器
#[derive(Debug)]
pub struct InvokePacketGen {
    pub controller: NodeId,
    pub matrix: TrafficMatrix,
    pub msg: String,
}

impl InvokePacketGen {
    pub const TYPE: &'static str = "SDN_invoke_pkt_gen_event";

    pub(crate) fn from_args(args: EventArgs) -> Result<Box<dyn Event>, SimError> {
        match args {
            EventArgs::InvokeGen {
                controller,
                matrix,
                msg,
            } => Ok(Box::new(Self {
                controller,
                matrix,
                msg,
            })),
            other => Err(other.mismatch(Self::TYPE, "invoke_gen")),
        }
    }
}

impl Event for InvokePacketGen {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(net) = network_of(world, Self::TYPE) else {
            return;
        };
        let Some(mut pkt) = stamp(net, SdnInvokePacket::TYPE, self.controller, self.controller) else {
            return;
        };
        let Self {
            controller,
            matrix,
            msg,
        } = *self;
        if fill_payload::<SdnInvokePayload>(&mut pkt, Self::TYPE, |pld| {
            pld.msg = msg;
            pld.matrix = matrix;
        }) {
            net.self_deliver(sim, controller, pkt);
        }
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn identity(&self) -> String {
        self.controller.0.to_string()
    }

    fn describe(&self, now: SimTime) -> String {
        gen_line(now, self.controller, self.controller, Self::TYPE)
    }
}
