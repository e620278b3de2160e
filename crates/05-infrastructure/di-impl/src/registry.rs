//! 能力注册表
//!
//! 把请求的类型（能力或具体类型）加可选的名称映射到唯一的实现类型。

use infrastructure_common::{ComponentType, DependencyError, DependencyResult, Scope, TypeInfo};
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 能力下的一条实现登记
#[derive(Debug, Clone)]
struct Registration {
    qualifier: String,
    component: Arc<ComponentType>,
}

/// 能力到实现的绑定信息，用于诊断报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingInfo {
    /// 能力类型
    pub capability: &'static str,
    /// 实现登记时使用的限定名
    pub qualifier: String,
    /// 实现类型
    pub implementation: &'static str,
    /// 实现的作用域
    pub scope: Scope,
}

/// 能力注册表
///
/// 具体类型请求直接按类型查找，不做消歧；只有能力（`dyn Trait`）请求才走限定名逻辑。
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    /// 具体类型
    components: HashMap<TypeId, Arc<ComponentType>>,
    /// 注册顺序
    order: Vec<TypeId>,
    /// 能力 -> 实现列表
    capabilities: HashMap<TypeId, (TypeInfo, Vec<Registration>)>,
}

impl CapabilityRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件类型声明的全部能力
    ///
    /// 对同一类型幂等，返回是否为新注册。
    pub fn register(&mut self, component: Arc<ComponentType>) -> bool {
        let type_info = component.type_info();
        if self.components.contains_key(&type_info.id) {
            return false;
        }

        let qualifier = component.effective_qualifier().to_string();
        for capability in component.capabilities() {
            let (_, registrations) = self
                .capabilities
                .entry(capability.id)
                .or_insert_with(|| (capability, Vec::new()));
            registrations.push(Registration {
                qualifier: qualifier.clone(),
                component: Arc::clone(&component),
            });
            debug!(
                "注册能力绑定: {} [{}] -> {}",
                capability.short_name(),
                qualifier,
                type_info.short_name()
            );
        }

        self.components.insert(type_info.id, component);
        self.order.push(type_info.id);
        true
    }

    /// 按具体类型查找
    pub fn component(&self, type_id: TypeId) -> Option<&Arc<ComponentType>> {
        self.components.get(&type_id)
    }

    /// 按注册顺序列出所有组件类型
    pub fn components(&self) -> impl Iterator<Item = &Arc<ComponentType>> + '_ {
        self.order.iter().filter_map(|id| self.components.get(id))
    }

    /// 请求的类型是否为已知的具体类型或至少有一个实现的能力
    pub fn knows(&self, requested: TypeId) -> bool {
        self.components.contains_key(&requested)
            || self
                .capabilities
                .get(&requested)
                .is_some_and(|(_, registrations)| !registrations.is_empty())
    }

    /// 列出能力的全部实现
    pub fn implementations(&self, capability: TypeId) -> Vec<Arc<ComponentType>> {
        self.capabilities
            .get(&capability)
            .map(|(_, registrations)| {
                registrations
                    .iter()
                    .map(|registration| Arc::clone(&registration.component))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 解析请求的类型
    ///
    /// 能力请求的解析顺序：
    /// 1. 显式限定名精确匹配
    /// 2. 请求名（参数名/字段名）与登记的限定名精确匹配
    /// 3. 只有一个实现时直接返回，忽略名称
    /// 4. 否则失败：没有实现为 `CapabilityNotFound`，多个实现为 `AmbiguousCapability`
    pub fn resolve(
        &self,
        requested: &TypeInfo,
        requested_name: Option<&str>,
        qualifier: Option<&str>,
    ) -> DependencyResult<Arc<ComponentType>> {
        if let Some(component) = self.components.get(&requested.id) {
            return Ok(Arc::clone(component));
        }

        let registrations = self
            .capabilities
            .get(&requested.id)
            .map_or(&[][..], |(_, registrations)| registrations.as_slice());

        if registrations.is_empty() {
            return Err(DependencyError::CapabilityNotFound {
                capability: requested.name.to_string(),
            });
        }

        if let Some(qualifier) = qualifier {
            if let Some(component) = Self::unique_match(requested, registrations, qualifier)? {
                return Ok(component);
            }
        }

        if let Some(name) = requested_name {
            if let Some(component) = Self::unique_match(requested, registrations, name)? {
                return Ok(component);
            }
        }

        if let [only] = registrations {
            return Ok(Arc::clone(&only.component));
        }

        Err(DependencyError::AmbiguousCapability {
            capability: requested.name.to_string(),
            candidates: registrations
                .iter()
                .map(|registration| {
                    format!(
                        "{}@{}",
                        registration.component.type_info().short_name(),
                        registration.qualifier
                    )
                })
                .collect(),
        })
    }

    fn unique_match(
        requested: &TypeInfo,
        registrations: &[Registration],
        name: &str,
    ) -> DependencyResult<Option<Arc<ComponentType>>> {
        let mut matches = registrations
            .iter()
            .filter(|registration| registration.qualifier == name);

        match (matches.next(), matches.next()) {
            (None, _) => Ok(None),
            (Some(only), None) => Ok(Some(Arc::clone(&only.component))),
            (Some(_), Some(_)) => Err(DependencyError::AmbiguousCapability {
                capability: format!("{}@{}", requested.name, name),
                candidates: registrations
                    .iter()
                    .filter(|registration| registration.qualifier == name)
                    .map(|registration| registration.component.type_info().name.to_string())
                    .collect(),
            }),
        }
    }

    /// 所有能力绑定，按能力名和限定名排序
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let mut bindings: Vec<BindingInfo> = self
            .capabilities
            .values()
            .flat_map(|(capability, registrations)| {
                registrations.iter().map(move |registration| BindingInfo {
                    capability: capability.name,
                    qualifier: registration.qualifier.clone(),
                    implementation: registration.component.type_info().name,
                    scope: registration.component.scope(),
                })
            })
            .collect();
        bindings.sort_by(|a, b| {
            a.capability
                .cmp(b.capability)
                .then_with(|| a.qualifier.cmp(&b.qualifier))
        });
        bindings
    }

    /// 已注册组件类型数量
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// 已注册能力数量
    pub fn capability_count(&self) -> usize {
        self.capabilities.len()
    }

    /// 清空注册表
    pub fn clear(&mut self) {
        self.components.clear();
        self.order.clear();
        self.capabilities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {}
    trait Clock: Send + Sync {}

    #[derive(Default)]
    struct EnglishGreeter;
    impl Greeter for EnglishGreeter {}

    #[derive(Default)]
    struct FrenchGreeter;
    impl Greeter for FrenchGreeter {}

    fn english() -> Arc<ComponentType> {
        ComponentType::builder::<EnglishGreeter>()
            .qualifier("en")
            .provides::<dyn Greeter>(|g| g)
            .build()
    }

    fn french() -> Arc<ComponentType> {
        ComponentType::builder::<FrenchGreeter>()
            .qualifier("fr")
            .provides::<dyn Greeter>(|g| g)
            .build()
    }

    fn greeter() -> TypeInfo {
        TypeInfo::of::<dyn Greeter>()
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = CapabilityRegistry::new();
        let component = english();

        assert!(registry.register(Arc::clone(&component)));
        assert!(!registry.register(component));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.implementations(greeter().id).len(), 1);
    }

    #[test]
    fn test_qualifier_selects_implementation() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());
        registry.register(french());

        let resolved = registry.resolve(&greeter(), None, Some("fr")).unwrap();
        assert_eq!(resolved.type_info(), TypeInfo::of::<FrenchGreeter>());
    }

    #[test]
    fn test_qualifier_takes_precedence_over_requested_name() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());
        registry.register(french());

        let resolved = registry.resolve(&greeter(), Some("en"), Some("fr")).unwrap();
        assert_eq!(resolved.type_info(), TypeInfo::of::<FrenchGreeter>());
    }

    #[test]
    fn test_requested_name_is_fallback_disambiguator() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());
        registry.register(french());

        let resolved = registry.resolve(&greeter(), Some("en"), None).unwrap();
        assert_eq!(resolved.type_info(), TypeInfo::of::<EnglishGreeter>());
    }

    #[test]
    fn test_multiple_candidates_without_name_is_ambiguous() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());
        registry.register(french());

        let err = registry.resolve(&greeter(), Some("greeter"), None).unwrap_err();
        match err {
            DependencyError::AmbiguousCapability { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("意外的错误: {other:?}"),
        }
    }

    #[test]
    fn test_single_candidate_fallback_ignores_names() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());

        for (name, qualifier) in [(None, None), (Some("other"), None), (None, Some("fr"))] {
            let resolved = registry.resolve(&greeter(), name, qualifier).unwrap();
            assert_eq!(resolved.type_info(), TypeInfo::of::<EnglishGreeter>());
        }
    }

    #[test]
    fn test_missing_capability() {
        let registry = CapabilityRegistry::new();
        let err = registry
            .resolve(&TypeInfo::of::<dyn Clock>(), None, None)
            .unwrap_err();
        assert!(matches!(err, DependencyError::CapabilityNotFound { .. }));
        assert!(!registry.knows(TypeId::of::<dyn Clock>()));
    }

    #[test]
    fn test_concrete_request_bypasses_qualifiers() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());
        registry.register(french());

        let resolved = registry
            .resolve(&TypeInfo::of::<FrenchGreeter>(), Some("en"), Some("en"))
            .unwrap();
        assert_eq!(resolved.type_info(), TypeInfo::of::<FrenchGreeter>());
    }

    #[test]
    fn test_duplicate_qualifier_is_ambiguous() {
        let mut registry = CapabilityRegistry::new();
        registry.register(english());
        registry.register(
            ComponentType::builder::<FrenchGreeter>()
                .qualifier("en")
                .provides::<dyn Greeter>(|g| g)
                .build(),
        );

        let err = registry.resolve(&greeter(), None, Some("en")).unwrap_err();
        assert!(matches!(err, DependencyError::AmbiguousCapability { .. }));
    }

    #[test]
    fn test_bindings_are_sorted() {
        let mut registry = CapabilityRegistry::new();
        registry.register(french());
        registry.register(english());

        let qualifiers: Vec<_> = registry.bindings().into_iter().map(|b| b.qualifier).collect();
        assert_eq!(qualifiers, vec!["en", "fr"]);
    }
}
