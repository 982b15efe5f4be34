//! 负载类型
//!
//! 负载带一个自由格式的 msg 字段，外加各变体自己的字段。
//! 具体变体通过 `as_any` 做带检查的向下转型。

use std::any::Any;
use std::fmt::Debug;

use super::id::NodeId;
use crate::error::SimError;
use crate::proto::TrafficMatrix;
use crate::registry::{Constructor, Registry};

/// 负载接口
pub trait Payload: Debug + Send + Any {
    fn type_name(&self) -> &'static str;
    fn msg(&self) -> &str;
    fn set_msg(&mut self, msg: String);

    /// 从同类型负载复制所有字段；类型不符时返回 `ContractViolation`。
    fn copy_from(&mut self, other: &dyn Payload) -> Result<(), SimError>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type PayloadRegistry = Registry<Constructor<dyn Payload, ()>>;

fn copy_same<P: Payload + Clone>(dst: &mut P, src: &dyn Payload) -> Result<(), SimError> {
    let src = src
        .as_any()
        .downcast_ref::<P>()
        .ok_or(SimError::ContractViolation {
            context: "payload copy",
            expected: dst.type_name(),
            found: src.type_name(),
        })?;
    *dst = src.clone();
    Ok(())
}

macro_rules! payload_common {
    ($ty:ident) => {
        fn type_name(&self) -> &'static str {
            $ty::TYPE
        }
        fn msg(&self) -> &str {
            &self.msg
        }
        fn set_msg(&mut self, msg: String) {
            self.msg = msg;
        }
        fn copy_from(&mut self, other: &dyn Payload) -> Result<(), SimError> {
            copy_same(self, other)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

/// 数据负载：只有 msg，数据量记录在数据包本身上。
#[derive(Debug, Clone, Default)]
pub struct TraDataPayload {
    pub msg: String,
}

impl TraDataPayload {
    pub const TYPE: &'static str = "TRA_data_payload";
}

impl Payload for TraDataPayload {
    payload_common!(TraDataPayload);
}

/// 洪泛控制负载：跳数计数器，每转发一次加一。
#[derive(Debug, Clone, Default)]
pub struct TraCtrlPayload {
    pub msg: String,
    pub counter: u32,
}

impl TraCtrlPayload {
    pub const TYPE: &'static str = "TRA_ctrl_payload";

    pub fn increase(&mut self) {
        self.counter = self.counter.saturating_add(1);
    }
}

impl Payload for TraCtrlPayload {
    payload_common!(TraCtrlPayload);
}

/// SDN 规则负载：match 目的地、action 下一跳、分流比例。
#[derive(Debug, Clone)]
pub struct SdnCtrlPayload {
    pub msg: String,
    pub mat: NodeId,
    pub act: NodeId,
    pub per: f64,
}

impl Default for SdnCtrlPayload {
    fn default() -> Self {
        Self {
            msg: String::new(),
            mat: NodeId::BROADCAST,
            act: NodeId::BROADCAST,
            per: 0.0,
        }
    }
}

impl SdnCtrlPayload {
    pub const TYPE: &'static str = "SDN_ctrl_payload";
}

impl Payload for SdnCtrlPayload {
    payload_common!(SdnCtrlPayload);
}

/// 控制器触发负载：携带全局流量矩阵。
#[derive(Debug, Clone, Default)]
pub struct SdnInvokePayload {
    pub msg: String,
    pub matrix: TrafficMatrix,
}

impl SdnInvokePayload {
    pub const TYPE: &'static str = "SDN_invoke_payload";
}

impl Payload for SdnInvokePayload {
    payload_common!(SdnInvokePayload);
}

fn boxed<P: Payload + Default>(_: ()) -> Box<dyn Payload> {
    Box::new(P::default())
}

/// 注册内置负载类型
pub fn builtin_payloads() -> PayloadRegistry {
    let mut reg: PayloadRegistry = Registry::new("payload");
    reg.register(TraDataPayload::TYPE, boxed::<TraDataPayload>);
    reg.register(TraCtrlPayload::TYPE, boxed::<TraCtrlPayload>);
    reg.register(SdnCtrlPayload::TYPE, boxed::<SdnCtrlPayload>);
    reg.register(SdnInvokePayload::TYPE, boxed::<SdnInvokePayload>);
    reg
}
