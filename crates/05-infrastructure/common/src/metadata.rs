//! 元数据定义
//!
//! 提供组件和能力的类型信息

use std::any::TypeId;
use std::fmt;

/// 类型信息
///
/// 同时用于具体类型（如 `EnglishGreeter`）和能力类型（如 `dyn Greeter`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称（含模块路径）
    pub name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    ///
    /// `dyn a::b::Greeter` 会得到 `Greeter`。
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let name = name.split(" + ").next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }

    /// 类型所在的模块路径
    pub fn module_path(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        name.rfind("::").map_or("", |pos| &name[..pos])
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 能力查找键：能力类型加可选的限定名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityKey {
    /// 能力类型
    pub capability: TypeInfo,
    /// 限定名
    pub qualifier: Option<String>,
}

impl CapabilityKey {
    /// 创建不带限定名的查找键
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            capability: TypeInfo::of::<C>(),
            qualifier: None,
        }
    }

    /// 创建查找键
    pub fn new(capability: TypeInfo, qualifier: Option<String>) -> Self {
        Self {
            capability,
            qualifier,
        }
    }

    /// 设置限定名
    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}@{}", self.capability.short_name(), qualifier),
            None => f.write_str(self.capability.short_name()),
        }
    }
}
