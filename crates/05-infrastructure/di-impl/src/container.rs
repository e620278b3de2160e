//! 组件容器
//!
//! 把能力注册表、实例存储、执行上下文和装配诊断组合成一个显式构造的上下文对象。
//! 容器本身不是全局状态，测试可以各自创建或调用 [`Container::reset`] 重新开始。

use crate::context::{ExecutionContext, ResolveContext};
use crate::diagnostics::{WiringDiagnostics, WiringEvent};
use crate::registry::{BindingInfo, CapabilityRegistry};
use crate::store::InstanceStore;
use di_abstractions::{ComponentRegistrar, ComponentResolver, ContainerConfig, ContainerStats, CyclePolicy};
use infrastructure_common::{
    CapabilityKey, ComponentRef, ComponentType, DependencyError, DependencyResult, Instance, Scope,
    WiringState,
};
use parking_lot::{ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 组件容器
pub struct Container {
    pub(crate) config: ContainerConfig,
    pub(crate) registry: RwLock<CapabilityRegistry>,
    pub(crate) store: InstanceStore,
    pub(crate) context: ExecutionContext,
    pub(crate) diagnostics: WiringDiagnostics,
    /// 单例创建和装配锁：同一线程可重入，其他线程等待当前创建结束
    pub(crate) creation: ReentrantMutex<()>,
    sealed: AtomicBool,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// 使用默认配置创建容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建容器
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(CapabilityRegistry::new()),
            store: InstanceStore::new(),
            context: ExecutionContext::new(),
            diagnostics: WiringDiagnostics::new(),
            creation: ReentrantMutex::new(()),
            sealed: AtomicBool::new(false),
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    fn ensure_open(&self, action: &str) -> DependencyResult<()> {
        if self.is_sealed() {
            return Err(DependencyError::configuration(format!(
                "容器已封存，不能再{action}"
            )));
        }
        Ok(())
    }

    /// 注册组件类型，返回是否为新注册
    pub fn register_type(&self, component: Arc<ComponentType>) -> DependencyResult<bool> {
        self.ensure_open("注册组件类型")?;

        let registered = self.registry.write().register(Arc::clone(&component));
        if registered {
            let implementation = component.type_info().short_name().to_string();
            let qualifier = component.effective_qualifier().to_string();
            for capability in component.capabilities() {
                self.diagnostics.record(WiringEvent::Binding {
                    capability: capability.short_name().to_string(),
                    qualifier: qualifier.clone(),
                    implementation: implementation.clone(),
                });
            }
        }
        Ok(registered)
    }

    /// 注册外部构建的单例实例
    ///
    /// 实例以 `NotStarted` 状态登记，首次解析时才执行字段注入和初始化钩子。
    pub fn register_instance(&self, component: Arc<ComponentType>, instance: Instance) -> DependencyResult<ComponentRef> {
        self.ensure_open("注册实例")?;

        let type_info = component.type_info();
        if component.scope() != Scope::Singleton {
            return Err(DependencyError::configuration(format!(
                "只能注册单例实例: {type_info} 的作用域为 {}",
                component.scope()
            )));
        }
        if (*instance).type_id() != type_info.id {
            return Err(DependencyError::configuration(format!(
                "实例类型与组件描述不符: 期望 {type_info}"
            )));
        }

        self.register_type(Arc::clone(&component))?;
        let stored = self
            .store
            .insert_singleton(ComponentRef::new(instance, component), WiringState::NotStarted);
        debug!("注册单例实例: {}", type_info.short_name());
        Ok(stored)
    }

    /// 在给定的解析上下文中解析查找键
    pub(crate) fn resolve_in(
        &self,
        key: &CapabilityKey,
        requested_name: Option<&str>,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<ComponentRef> {
        let component = self
            .registry
            .read()
            .resolve(&key.capability, requested_name, key.qualifier.as_deref())?;
        self.obtain(&component, ctx)
    }

    /// 取得组件实例：检查执行上下文，按作用域复用或创建，并保证返回前已装配
    /// （循环中的装配中实例除外）
    pub(crate) fn obtain(&self, component: &Arc<ComponentType>, ctx: &mut ResolveContext) -> DependencyResult<ComponentRef> {
        self.context.check(component)?;
        ctx.enter(component.type_info(), self.config.max_resolution_depth)?;
        let result = match component.scope() {
            Scope::Singleton => self.obtain_singleton(component, ctx),
            Scope::PerRequest => self.create_and_wire(component, ctx),
        };
        ctx.leave();
        result
    }

    fn obtain_singleton(&self, component: &Arc<ComponentType>, ctx: &mut ResolveContext) -> DependencyResult<ComponentRef> {
        if let Some((instance, WiringState::Complete)) = self.store.lookup(component.type_info().id) {
            return Ok(instance);
        }

        // 装配中的实例只对持有锁的线程可见
        let _creation = self.creation.lock();
        let Some((instance, state)) = self.store.lookup(component.type_info().id) else {
            let instance = self.instantiate(component, ctx)?;
            let stored = self
                .store
                .insert_singleton(ComponentRef::new(instance, Arc::clone(component)), WiringState::NotStarted);
            self.wire(&stored, ctx)?;
            return Ok(stored);
        };

        match state {
            WiringState::Complete => Ok(instance),
            WiringState::NotStarted => {
                self.wire(&instance, ctx)?;
                Ok(instance)
            }
            WiringState::InProgress => match self.config.cycle_policy {
                CyclePolicy::Tolerate => {
                    debug!(
                        "检测到字段循环依赖，返回装配中的实例: {}",
                        ctx.describe_path()
                    );
                    Ok(instance)
                }
                CyclePolicy::Reject => Err(DependencyError::CircularDependency {
                    dependency_chain: ctx.describe_path(),
                }),
            },
        }
    }

    /// 解析组件类型本身（不经过能力消歧）
    pub fn resolve_component(&self, component: &Arc<ComponentType>) -> DependencyResult<ComponentRef> {
        let mut ctx = ResolveContext::new();
        self.obtain(component, &mut ctx)
    }

    /// 创建实例但不执行字段注入
    ///
    /// 单例以 `NotStarted` 状态登记，装配推迟到首次解析或 [`Container::inject`]；
    /// 已存在的单例直接返回。
    pub fn construct(&self, component: &Arc<ComponentType>) -> DependencyResult<ComponentRef> {
        self.context.check(component)?;
        let _creation = self.creation.lock();
        if let Some((existing, _)) = self.store.lookup(component.type_info().id) {
            return Ok(existing);
        }

        let mut ctx = ResolveContext::new();
        ctx.enter(component.type_info(), self.config.max_resolution_depth)?;
        let instance = self.instantiate(component, &mut ctx);
        ctx.leave();

        let created = ComponentRef::new(instance?, Arc::clone(component));
        Ok(match component.scope() {
            Scope::Singleton => self.store.insert_singleton(created, WiringState::NotStarted),
            Scope::PerRequest => created,
        })
    }

    fn create_and_wire(&self, component: &Arc<ComponentType>, ctx: &mut ResolveContext) -> DependencyResult<ComponentRef> {
        let instance = self.instantiate(component, ctx)?;
        let created = ComponentRef::new(instance, Arc::clone(component));
        self.wire(&created, ctx)?;
        Ok(created)
    }

    /// 所有能力绑定
    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.registry.read().bindings()
    }

    /// 按注册顺序列出所有组件类型
    pub fn components(&self) -> Vec<Arc<ComponentType>> {
        self.registry.read().components().cloned().collect()
    }

    /// 查找能力的全部实现
    pub fn implementations(&self, capability: std::any::TypeId) -> Vec<Arc<ComponentType>> {
        self.registry.read().implementations(capability)
    }

    /// 实例的装配状态
    pub fn wiring_state(&self, instance: &ComponentRef) -> WiringState {
        self.store.state_of(instance)
    }

    /// 把当前线程指定为 UI 事件线程
    pub fn designate_ui_thread(&self) -> DependencyResult<()> {
        self.context.designate_ui_thread()
    }

    /// 执行上下文
    pub fn execution_context(&self) -> &ExecutionContext {
        &self.context
    }

    /// 装配诊断日志
    pub fn diagnostics(&self) -> &WiringDiagnostics {
        &self.diagnostics
    }

    /// 统计信息
    pub fn stats(&self) -> ContainerStats {
        let registry = self.registry.read();
        ContainerStats {
            registered_components: registry.len(),
            registered_capabilities: registry.capability_count(),
            active_singletons: self.store.singleton_count(),
            wired_singletons: self.store.wired_singleton_count(),
        }
    }

    /// 封存容器：之后注册会失败，解析不受影响
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::SeqCst) {
            info!("容器已封存: {:?}", self.stats());
        }
    }

    /// 是否已封存
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// 清空注册表、实例存储、UI 线程指定和诊断日志，仅用于测试
    pub fn reset(&self) {
        warn!("重置容器");
        self.registry.write().clear();
        self.store.clear();
        self.context.clear();
        self.diagnostics.restart();
        self.sealed.store(false, Ordering::SeqCst);
    }
}

impl ComponentResolver for Container {
    fn resolve_key(&self, key: &CapabilityKey, requested_name: Option<&str>) -> DependencyResult<ComponentRef> {
        let mut ctx = ResolveContext::new();
        self.resolve_in(key, requested_name, &mut ctx)
    }

    fn can_resolve(&self, key: &CapabilityKey) -> bool {
        self.registry.read().knows(key.capability.id)
    }
}

impl ComponentRegistrar for Container {
    fn register_type(&self, component: Arc<ComponentType>) -> DependencyResult<bool> {
        Container::register_type(self, component)
    }

    fn register_instance(&self, component: Arc<ComponentType>, instance: Instance) -> DependencyResult<ComponentRef> {
        Container::register_instance(self, component, instance)
    }

    fn designate_ui_thread(&self) -> DependencyResult<()> {
        Container::designate_ui_thread(self)
    }
}
