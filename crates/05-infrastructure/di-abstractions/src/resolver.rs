//! 组件解析器抽象接口

use infrastructure_common::{CapabilityKey, ComponentRef, DependencyError, DependencyResult};
use std::sync::Arc;

/// 组件解析器 trait
///
/// 负责把能力查找键解析为组件实例，必要时创建并装配实例。
pub trait ComponentResolver: Send + Sync {
    /// 解析查找键；`requested_name` 是参数名或字段名，作为限定名的后备消歧依据
    fn resolve_key(&self, key: &CapabilityKey, requested_name: Option<&str>) -> DependencyResult<ComponentRef>;

    /// 检查查找键的能力是否有已注册的实现
    fn can_resolve(&self, key: &CapabilityKey) -> bool;
}

/// [`ComponentResolver`] 的强类型扩展
pub trait TypedComponentResolver {
    /// 解析能力（`dyn Trait`）或具体类型
    fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<C>>;

    /// 以名称作为后备消歧依据解析
    fn resolve_named<C: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DependencyResult<Arc<C>>;

    /// 以显式限定名解析
    fn resolve_qualified<C: ?Sized + Send + Sync + 'static>(&self, qualifier: &str) -> DependencyResult<Arc<C>>;

    /// 插槽式查找：没有实现时返回 `None` 而不是失败
    fn try_resolve<C: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Option<Arc<C>>>;
}

impl<R: ComponentResolver + ?Sized> TypedComponentResolver for R {
    fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<C>> {
        let key = CapabilityKey::of::<C>();
        let component = self.resolve_key(&key, None)?;
        cast_resolved(&key, &component)
    }

    fn resolve_named<C: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DependencyResult<Arc<C>> {
        let key = CapabilityKey::of::<C>();
        let component = self.resolve_key(&key, Some(name))?;
        cast_resolved(&key, &component)
    }

    fn resolve_qualified<C: ?Sized + Send + Sync + 'static>(&self, qualifier: &str) -> DependencyResult<Arc<C>> {
        let key = CapabilityKey::of::<C>().qualified(qualifier);
        let component = self.resolve_key(&key, None)?;
        cast_resolved(&key, &component)
    }

    fn try_resolve<C: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Option<Arc<C>>> {
        match self.resolve::<C>() {
            Ok(value) => Ok(Some(value)),
            Err(DependencyError::CapabilityNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn cast_resolved<C: ?Sized + Send + Sync + 'static>(
    key: &CapabilityKey,
    component: &ComponentRef,
) -> DependencyResult<Arc<C>> {
    component
        .cast::<C>()
        .ok_or_else(|| DependencyError::CapabilityNotFound {
            capability: format!("{} (由 {} 解析但未提供)", key, component.component().type_info()),
        })
}
