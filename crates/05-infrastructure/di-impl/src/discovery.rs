//! 静态注册的组件目录
//!
//! 候选类型在程序中显式登记；按模块路径前缀限定的范围在首次查询时建立索引并缓存。

use dashmap::DashMap;
use di_abstractions::ComponentDiscovery;
use infrastructure_common::{ComponentType, DependencyError, DependencyResult, Marker};
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

/// 组件目录
pub struct CatalogDiscovery {
    name: String,
    entries: Vec<Arc<ComponentType>>,
    /// 范围 -> 该范围内的类型
    scopes: DashMap<String, Arc<Vec<Arc<ComponentType>>>>,
}

impl CatalogDiscovery {
    /// 创建空目录
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            scopes: DashMap::new(),
        }
    }

    /// 登记一组组件类型
    pub fn with_components(mut self, components: impl IntoIterator<Item = Arc<ComponentType>>) -> Self {
        for component in components {
            self.register(component);
        }
        self
    }

    /// 登记组件类型，同一类型只保留第一次登记
    pub fn register(&mut self, component: Arc<ComponentType>) -> bool {
        let id = component.type_info().id;
        if self.entries.iter().any(|entry| entry.type_info().id == id) {
            return false;
        }
        self.entries.push(component);
        self.scopes.clear();
        true
    }

    /// 全部登记的类型
    pub fn entries(&self) -> &[Arc<ComponentType>] {
        &self.entries
    }

    /// 已建立索引的范围数量
    pub fn indexed_scopes(&self) -> usize {
        self.scopes.len()
    }

    fn scope_index(&self, scope: Option<&str>) -> DependencyResult<Arc<Vec<Arc<ComponentType>>>> {
        if let Some(prefix) = scope {
            if prefix.trim().is_empty() {
                return Err(DependencyError::Discovery {
                    message: "扫描范围不能为空字符串".to_string(),
                });
            }
        }

        let key = scope.unwrap_or_default();
        if let Some(index) = self.scopes.get(key) {
            return Ok(Arc::clone(index.value()));
        }

        let index: Vec<_> = self
            .entries
            .iter()
            .filter(|component| scope.map_or(true, |prefix| in_scope(component.type_info().module_path(), prefix)))
            .cloned()
            .collect();
        debug!(
            "扫描范围 {}: 找到 {} 个类型",
            scope.unwrap_or("<全部>"),
            index.len()
        );

        let index = Arc::clone(
            self.scopes
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(index))
                .value(),
        );
        Ok(index)
    }
}

/// 模块路径等于范围，或位于范围的子模块中
fn in_scope(module_path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches("::");
    module_path
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl ComponentDiscovery for CatalogDiscovery {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_by_marker(&self, marker: Marker, scope: Option<&str>) -> DependencyResult<Vec<Arc<ComponentType>>> {
        Ok(self
            .scope_index(scope)?
            .iter()
            .filter(|component| component.has_marker(marker))
            .cloned()
            .collect())
    }

    fn find_by_capability(&self, capability: TypeId, scope: Option<&str>) -> DependencyResult<Vec<Arc<ComponentType>>> {
        Ok(self
            .scope_index(scope)?
            .iter()
            .filter(|component| component.provides(capability))
            .cloned()
            .collect())
    }

    fn find_by_name(&self, name: &str) -> Option<Arc<ComponentType>> {
        self.entries
            .iter()
            .find(|component| {
                let type_info = component.type_info();
                component.name() == name || type_info.short_name() == name || type_info.name == name
            })
            .cloned()
    }
}
