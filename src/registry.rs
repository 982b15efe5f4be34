//! 类型注册表
//!
//! 每个可扩展的类型族（事件、包头、负载、数据包、节点、链路）各自维护一张
//! 名字 -> 构造器的表。新变体只需在初始化时注册，分发代码无需修改。

use std::collections::BTreeMap;

use crate::error::SimError;
use tracing::{debug, warn};

/// 最常见的构造器形态：一个参数，返回新拥有的实例。
pub type Constructor<T, A> = fn(A) -> Box<T>;

/// 名字 -> 构造器 映射
#[derive(Debug, Clone)]
pub struct Registry<C> {
    family: &'static str,
    entries: BTreeMap<&'static str, C>,
}

impl<C> Registry<C> {
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            entries: BTreeMap::new(),
        }
    }

    /// 类型族名称（用于日志与错误信息）
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// 注册一个类型。重复注册同名类型保留第一次的构造器，返回 false。
    pub fn register(&mut self, name: &'static str, ctor: C) -> bool {
        if self.entries.contains_key(name) {
            debug!(family = self.family, name, "类型已注册，忽略重复注册");
            return false;
        }
        self.entries.insert(name, ctor);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 查找构造器
    pub fn lookup(&self, name: &str) -> Result<&C, SimError> {
        self.entries.get(name).ok_or_else(|| SimError::UnknownType {
            family: self.family,
            name: name.to_string(),
        })
    }

    /// 已注册的类型名（按字典序）
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized, A> Registry<Constructor<T, A>> {
    /// 按名字构造实例；未注册时记录日志并返回 None。
    pub fn create(&self, name: &str, args: A) -> Option<Box<T>> {
        match self.lookup(name) {
            Ok(ctor) => Some(ctor(args)),
            Err(err) => {
                warn!(%err, "构造失败");
                None
            }
        }
    }
}
