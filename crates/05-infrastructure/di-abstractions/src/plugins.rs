//! 可选协作者（插槽）
//!
//! 持久化和 UI 协作者都是可选的：启动器在启动期间查找一次，找不到只记录日志。

use crate::registry::ComponentRegistrar;
use infrastructure_common::{BoxError, ComponentRef, ComponentType};
use std::sync::Arc;

/// 交给持久化协作者的启动上下文
pub struct PersistenceHandoff<'a> {
    /// 应用根
    pub application_root: &'a ComponentRef,
    /// 发现阶段得到的候选类型
    pub candidates: &'a [Arc<ComponentType>],
    /// 用于注册数据访问组件
    pub registrar: &'a dyn ComponentRegistrar,
}

/// 持久化协作者
///
/// 负责构建并注册数据库相关的组件，最多被调用一次。
pub trait PersistenceProvider: Send + Sync {
    /// 协作者名称
    fn name(&self) -> &str;

    /// 构建并注册数据访问组件
    fn initialize(&self, handoff: &PersistenceHandoff<'_>) -> Result<(), BoxError>;
}

/// 交给 UI 协作者的启动上下文
pub struct UiHandoff<'a> {
    /// 唯一的 UI 根类型
    pub ui_root: &'a Arc<ComponentType>,
    /// 应用根
    pub application_root: &'a ComponentRef,
    /// 发现阶段得到的候选类型
    pub candidates: &'a [Arc<ComponentType>],
    /// 用于指定 UI 线程、注册和解析 UI 组件
    pub registrar: &'a dyn ComponentRegistrar,
}

/// UI 协作者
///
/// 负责在 UI 事件线程上构建并注册 UI 组件，最多被调用一次。
pub trait UiHost: Send + Sync {
    /// 协作者名称
    fn name(&self) -> &str;

    /// 确认能否承载给定的 UI 根类型
    fn can_host(&self, ui_root: &ComponentType) -> bool;

    /// 构建并注册 UI 组件
    fn initialize(&self, handoff: &UiHandoff<'_>) -> Result<(), BoxError>;
}
