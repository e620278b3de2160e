//! 组件注册接口

use crate::resolver::ComponentResolver;
use infrastructure_common::{ComponentRef, ComponentType, DependencyResult, Instance};
use std::sync::Arc;

/// 组件注册器 trait
///
/// 启动期间交给持久化和 UI 协作者，用于注册它们构建的组件。
/// 启动完成（容器封存）后注册会失败。
pub trait ComponentRegistrar: ComponentResolver {
    /// 注册组件类型，同一类型重复注册是幂等的，返回是否为新注册
    fn register_type(&self, component: Arc<ComponentType>) -> DependencyResult<bool>;

    /// 注册外部构建的单例实例
    ///
    /// 实例在首次解析时才执行字段注入和初始化钩子。
    fn register_instance(&self, component: Arc<ComponentType>, instance: Instance) -> DependencyResult<ComponentRef>;

    /// 把当前线程指定为 UI 事件线程
    fn designate_ui_thread(&self) -> DependencyResult<()>;
}
