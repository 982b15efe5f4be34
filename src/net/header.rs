//! 包头类型
//!
//! 所有包头都携带 源/目的/上一跳/下一跳 四个字段，默认值为广播哨兵。
//! 各变体只在类型名上有区别，由注册表按名字构造。

use std::fmt::Debug;

use super::id::NodeId;
use crate::registry::{Constructor, Registry};

/// 包头字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFields {
    pub src: NodeId,
    pub dst: NodeId,
    pub pre: NodeId,
    pub next: NodeId,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            src: NodeId::BROADCAST,
            dst: NodeId::BROADCAST,
            pre: NodeId::BROADCAST,
            next: NodeId::BROADCAST,
        }
    }
}

/// 包头接口
pub trait Header: Debug + Send {
    fn type_name(&self) -> &'static str;
    fn fields(&self) -> &HeaderFields;
    fn fields_mut(&mut self) -> &mut HeaderFields;

    fn src(&self) -> NodeId {
        self.fields().src
    }
    fn dst(&self) -> NodeId {
        self.fields().dst
    }
    fn pre(&self) -> NodeId {
        self.fields().pre
    }
    fn next(&self) -> NodeId {
        self.fields().next
    }
    fn set_src(&mut self, id: NodeId) {
        self.fields_mut().src = id;
    }
    fn set_dst(&mut self, id: NodeId) {
        self.fields_mut().dst = id;
    }
    fn set_pre(&mut self, id: NodeId) {
        self.fields_mut().pre = id;
    }
    fn set_next(&mut self, id: NodeId) {
        self.fields_mut().next = id;
    }
}

pub type HeaderRegistry = Registry<Constructor<dyn Header, ()>>;

macro_rules! header_variant {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $ty {
            fields: HeaderFields,
        }

        impl $ty {
            pub const TYPE: &'static str = $name;

            fn boxed(_: ()) -> Box<dyn Header> {
                Box::new(Self::default())
            }
        }

        impl Header for $ty {
            fn type_name(&self) -> &'static str {
                Self::TYPE
            }
            fn fields(&self) -> &HeaderFields {
                &self.fields
            }
            fn fields_mut(&mut self) -> &mut HeaderFields {
                &mut self.fields
            }
        }
    };
}

header_variant!(
    /// 数据包头
    TraDataHeader,
    "TRA_data_header"
);
header_variant!(
    /// 洪泛控制包头
    TraCtrlHeader,
    "TRA_ctrl_header"
);
header_variant!(
    /// SDN 规则包头
    SdnCtrlHeader,
    "SDN_ctrl_header"
);
header_variant!(
    /// 控制器触发包头
    SdnInvokeHeader,
    "SDN_invoke_header"
);

/// 注册内置包头类型
pub fn builtin_headers() -> HeaderRegistry {
    let mut reg: HeaderRegistry = Registry::new("header");
    reg.register(TraDataHeader::TYPE, TraDataHeader::boxed);
    reg.register(TraCtrlHeader::TYPE, TraCtrlHeader::boxed);
    reg.register(SdnCtrlHeader::TYPE, SdnCtrlHeader::boxed);
    reg.register(SdnInvokeHeader::TYPE, SdnInvokeHeader::boxed);
    reg
}
