//! 数据包类型
//!
//! 数据包独占一个包头和一个负载。包由 `PacketFactory` 按类型名构造：
//! 新包分配递增的 id，复制出的包保留原 id。每个存活的包持有一个
//! `LiveToken`，用于泄漏审计。

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use super::header::{
    Header, HeaderRegistry, SdnCtrlHeader, SdnInvokeHeader, TraCtrlHeader, TraDataHeader,
    builtin_headers,
};
use super::id::PacketId;
use super::payload::{
    Payload, PayloadRegistry, SdnCtrlPayload, SdnInvokePayload, TraCtrlPayload, TraDataPayload,
    builtin_payloads,
};
use crate::error::SimError;
use crate::registry::Registry;
use tracing::{trace, warn};

/// 存活包计数器（同一个 factory 产出的所有包共享）
#[derive(Debug, Clone, Default)]
pub struct PacketLedger(Arc<AtomicI64>);

impl PacketLedger {
    pub fn live(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }

    fn token(&self) -> LiveToken {
        self.0.fetch_add(1, Ordering::Relaxed);
        LiveToken(Arc::clone(&self.0))
    }
}

/// 存活凭证：随包一起释放时计数减一
pub struct LiveToken(Arc<AtomicI64>);

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Debug for LiveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LiveToken")
    }
}

/// 各数据包变体共有的部分
#[derive(Debug)]
pub struct PacketCore {
    id: PacketId,
    header: Box<dyn Header>,
    payload: Box<dyn Payload>,
    _live: LiveToken,
}

/// 数据包接口
pub trait Packet: Debug + Send + Any + 'static {
    fn type_name(&self) -> &'static str;
    fn core(&self) -> &PacketCore;
    fn core_mut(&mut self) -> &mut PacketCore;

    /// 事件日志里附加的类型相关信息
    fn extra_info(&self) -> String {
        String::new()
    }

    /// 复制变体自己的字段（包头/负载之外）
    fn copy_fields_from(&mut self, _other: &dyn Packet) -> Result<(), SimError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn id(&self) -> PacketId {
        self.core().id
    }
    fn header(&self) -> &dyn Header {
        &*self.core().header
    }
    fn header_mut(&mut self) -> &mut dyn Header {
        &mut *self.core_mut().header
    }
    fn payload(&self) -> &dyn Payload {
        &*self.core().payload
    }
    fn payload_mut(&mut self) -> &mut dyn Payload {
        &mut *self.core_mut().payload
    }
}

impl dyn Packet {
    pub fn downcast_ref<P: Packet>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }

    pub fn downcast_mut<P: Packet>(&mut self) -> Option<&mut P> {
        self.as_any_mut().downcast_mut::<P>()
    }

    pub fn payload_as<P: Payload>(&self) -> Option<&P> {
        self.payload().as_any().downcast_ref::<P>()
    }

    pub fn payload_as_mut<P: Payload>(&mut self) -> Option<&mut P> {
        self.payload_mut().as_any_mut().downcast_mut::<P>()
    }

    /// 带检查的负载访问：类型不符时给出 `ContractViolation`。
    pub fn payload_checked<P: Payload>(&self, context: &'static str) -> Result<&P, SimError> {
        let found = self.payload().type_name();
        self.payload_as::<P>().ok_or(SimError::ContractViolation {
            context,
            expected: std::any::type_name::<P>(),
            found,
        })
    }

    pub fn payload_checked_mut<P: Payload>(
        &mut self,
        context: &'static str,
    ) -> Result<&mut P, SimError> {
        let found = self.payload().type_name();
        self.payload_as_mut::<P>().ok_or(SimError::ContractViolation {
            context,
            expected: std::any::type_name::<P>(),
            found,
        })
    }
}

macro_rules! packet_common {
    ($ty:ident) => {
        fn type_name(&self) -> &'static str {
            $ty::TYPE
        }
        fn core(&self) -> &PacketCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut PacketCore {
            &mut self.core
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

/// 数据包：携带一个浮点数据量
#[derive(Debug)]
pub struct TraDataPacket {
    core: PacketCore,
    pub size: f64,
}

impl TraDataPacket {
    pub const TYPE: &'static str = "TRA_data_packet";
}

impl Packet for TraDataPacket {
    packet_common!(TraDataPacket);

    fn extra_info(&self) -> String {
        format!(" size {:.6}", self.size)
    }

    fn copy_fields_from(&mut self, other: &dyn Packet) -> Result<(), SimError> {
        let other = other
            .downcast_ref::<TraDataPacket>()
            .ok_or(SimError::ContractViolation {
                context: "packet replicate",
                expected: Self::TYPE,
                found: other.type_name(),
            })?;
        self.size = other.size;
        Ok(())
    }
}

/// 洪泛控制包
#[derive(Debug)]
pub struct TraCtrlPacket {
    core: PacketCore,
}

impl TraCtrlPacket {
    pub const TYPE: &'static str = "TRA_ctrl_packet";
}

impl Packet for TraCtrlPacket {
    packet_common!(TraCtrlPacket);

    fn extra_info(&self) -> String {
        match self.core.payload.as_any().downcast_ref::<TraCtrlPayload>() {
            Some(pld) => format!(" counter {}", pld.counter),
            None => String::new(),
        }
    }
}

/// SDN 规则包
#[derive(Debug)]
pub struct SdnCtrlPacket {
    core: PacketCore,
}

impl SdnCtrlPacket {
    pub const TYPE: &'static str = "SDN_ctrl_packet";
}

impl Packet for SdnCtrlPacket {
    packet_common!(SdnCtrlPacket);
}

/// 控制器触发包
#[derive(Debug)]
pub struct SdnInvokePacket {
    core: PacketCore,
}

impl SdnInvokePacket {
    pub const TYPE: &'static str = "SDN_invoke_packet";
}

impl Packet for SdnInvokePacket {
    packet_common!(SdnInvokePacket);
}

/// 数据包原型：声明包头/负载类型名以及如何包装 `PacketCore`
#[derive(Debug, Clone, Copy)]
pub struct PacketPrototype {
    pub header: &'static str,
    pub payload: &'static str,
    pub build: fn(PacketCore) -> Box<dyn Packet>,
}

/// 数据包工厂：持有包头/负载/数据包三张注册表、id 计数器和存活计数。
#[derive(Debug)]
pub struct PacketFactory {
    headers: HeaderRegistry,
    payloads: PayloadRegistry,
    packets: Registry<PacketPrototype>,
    next_id: PacketId,
    ledger: PacketLedger,
}

impl Default for PacketFactory {
    fn default() -> Self {
        let mut packets = Registry::new("packet");
        packets.register(
            TraDataPacket::TYPE,
            PacketPrototype {
                header: TraDataHeader::TYPE,
                payload: TraDataPayload::TYPE,
                build: |core| -> Box<dyn Packet> { Box::new(TraDataPacket { core, size: 1.0 }) },
            },
        );
        packets.register(
            TraCtrlPacket::TYPE,
            PacketPrototype {
                header: TraCtrlHeader::TYPE,
                payload: TraCtrlPayload::TYPE,
                build: |core| -> Box<dyn Packet> { Box::new(TraCtrlPacket { core }) },
            },
        );
        packets.register(
            SdnCtrlPacket::TYPE,
            PacketPrototype {
                header: SdnCtrlHeader::TYPE,
                payload: SdnCtrlPayload::TYPE,
                build: |core| -> Box<dyn Packet> { Box::new(SdnCtrlPacket { core }) },
            },
        );
        packets.register(
            SdnInvokePacket::TYPE,
            PacketPrototype {
                header: SdnInvokeHeader::TYPE,
                payload: SdnInvokePayload::TYPE,
                build: |core| -> Box<dyn Packet> { Box::new(SdnInvokePacket { core }) },
            },
        );
        Self {
            headers: builtin_headers(),
            payloads: builtin_payloads(),
            packets,
            next_id: 0,
            ledger: PacketLedger::default(),
        }
    }
}

impl PacketFactory {
    pub fn headers_mut(&mut self) -> &mut HeaderRegistry {
        &mut self.headers
    }

    pub fn payloads_mut(&mut self) -> &mut PayloadRegistry {
        &mut self.payloads
    }

    pub fn packets(&self) -> &Registry<PacketPrototype> {
        &self.packets
    }

    /// 注册新的数据包类型（包头和负载类型需已注册）
    pub fn register_packet(&mut self, name: &'static str, proto: PacketPrototype) -> bool {
        self.packets.register(name, proto)
    }

    /// 当前存活的包数
    pub fn live_packets(&self) -> i64 {
        self.ledger.live()
    }

    pub fn ledger(&self) -> PacketLedger {
        self.ledger.clone()
    }

    /// 下一个将被分配的包 id
    pub fn peek_next_id(&self) -> PacketId {
        self.next_id
    }

    fn assemble(&self, proto: &PacketPrototype, id: PacketId) -> Option<Box<dyn Packet>> {
        let header = self.headers.create(proto.header, ())?;
        let payload = self.payloads.create(proto.payload, ())?;
        Some((proto.build)(PacketCore {
            id,
            header,
            payload,
            _live: self.ledger.token(),
        }))
    }

    /// 按类型名构造新包，分配新的 id。
    pub fn create(&mut self, type_name: &str) -> Option<Box<dyn Packet>> {
        let proto = match self.packets.lookup(type_name) {
            Ok(proto) => *proto,
            Err(err) => {
                warn!(%err, "无法构造数据包");
                return None;
            }
        };
        let id = self.next_id;
        let pkt = self.assemble(&proto, id)?;
        self.next_id = self.next_id.wrapping_add(1);
        trace!(pkt_id = id, pkt_type = type_name, "构造数据包");
        Some(pkt)
    }

    /// 复制一个包：按其自身类型名查原型，复制包头/负载/变体字段，保留 id。
    pub fn replicate(&self, pkt: &dyn Packet) -> Option<Box<dyn Packet>> {
        let proto = match self.packets.lookup(pkt.type_name()) {
            Ok(proto) => *proto,
            Err(err) => {
                warn!(%err, pkt_id = pkt.id(), "无法复制数据包");
                return None;
            }
        };
        let mut copy = self.assemble(&proto, pkt.id())?;
        *copy.header_mut().fields_mut() = *pkt.header().fields();
        let copied = copy
            .payload_mut()
            .copy_from(pkt.payload())
            .and_then(|()| copy.copy_fields_from(pkt));
        if let Err(err) = copied {
            warn!(%err, pkt_id = pkt.id(), "复制数据包失败");
            return None;
        }
        Some(copy)
    }
}
