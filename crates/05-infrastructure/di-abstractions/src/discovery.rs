//! 组件发现抽象接口
//!
//! 发现协作者负责枚举候选组件类型；容器只消费查询结果。

use infrastructure_common::{ComponentType, DependencyResult, Marker};
use std::any::TypeId;
use std::sync::Arc;

/// 组件发现器 trait
///
/// 所有查询都可以用模块路径前缀限定范围，`None` 表示全部。
/// 首次查询某个范围时实现方应按需完成该范围的扫描并缓存结果。
pub trait ComponentDiscovery: Send + Sync {
    /// 获取发现器名称
    fn name(&self) -> &str;

    /// 查找带有指定标记的类型
    fn find_by_marker(&self, marker: Marker, scope: Option<&str>) -> DependencyResult<Vec<Arc<ComponentType>>>;

    /// 查找提供指定能力的类型
    fn find_by_capability(
        &self,
        capability: TypeId,
        scope: Option<&str>,
    ) -> DependencyResult<Vec<Arc<ComponentType>>>;

    /// 按组件名称或类型短名查找
    fn find_by_name(&self, name: &str) -> Option<Arc<ComponentType>>;
}
