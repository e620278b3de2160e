//! 启动器
//!
//! 线性、只执行一次的启动流程：
//!
//! `Idle -> Scanning -> RootConstruction -> PersistenceHandoff -> Wiring -> UiHandoff -> Ready`
//!
//! 任何一步失败都会中止整个流程，已经创建的单例保留在容器中不回滚；
//! 之后再次启动会失败，直到调用 [`Bootstrapper::reset`]。

use crate::args::StartupOptions;
use crate::config::BootstrapConfig;
use di_abstractions::{
    ComponentDiscovery, PersistenceHandoff, PersistenceProvider, TypedComponentResolver, UiHandoff, UiHost,
};
use di_impl::{select_constructor, Container, WiringReport};
use infrastructure_common::{
    ComponentRef, ComponentType, DependencyError, InfrastructureResult, Marker, Scope, StartupArgs,
};
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 启动阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// 尚未启动
    Idle,
    /// 发现候选类型
    Scanning,
    /// 构造应用根
    RootConstruction,
    /// 交给持久化协作者
    PersistenceHandoff,
    /// 装配全部候选类型
    Wiring,
    /// 交给 UI 协作者
    UiHandoff,
    /// 启动完成
    Ready,
    /// 启动失败
    Failed,
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Scanning => "Scanning",
            Self::RootConstruction => "RootConstruction",
            Self::PersistenceHandoff => "PersistenceHandoff",
            Self::Wiring => "Wiring",
            Self::UiHandoff => "UiHandoff",
            Self::Ready => "Ready",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 启动结果
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// 应用根
    pub application_root: ComponentRef,
    /// 发现阶段得到的候选类型（含配置标记类型）
    pub candidates: Vec<Arc<ComponentType>>,
    /// 是否为无界面模式
    pub headless: bool,
    /// 是否执行了持久化交接
    pub persistence_initialized: bool,
    /// 是否执行了 UI 交接
    pub ui_initialized: bool,
    /// 装配报告
    pub report: WiringReport,
}

/// 启动器
pub struct Bootstrapper {
    container: Arc<Container>,
    discovery: Arc<dyn ComponentDiscovery>,
    root: Arc<ComponentType>,
    config: BootstrapConfig,
    persistence: Option<Arc<dyn PersistenceProvider>>,
    ui_host: Option<Arc<dyn UiHost>>,
    phase: RwLock<BootstrapPhase>,
    outcome: RwLock<Option<Arc<BootstrapOutcome>>>,
    run_lock: Mutex<()>,
}

impl Bootstrapper {
    /// 创建启动器，容器按配置新建
    pub fn new(discovery: Arc<dyn ComponentDiscovery>, root: Arc<ComponentType>, config: BootstrapConfig) -> Self {
        let container = Arc::new(Container::with_config(config.container_config()));
        Self {
            container,
            discovery,
            root,
            config,
            persistence: None,
            ui_host: None,
            phase: RwLock::new(BootstrapPhase::Idle),
            outcome: RwLock::new(None),
            run_lock: Mutex::new(()),
        }
    }

    /// 使用已有的容器
    pub fn with_container(mut self, container: Arc<Container>) -> Self {
        self.container = container;
        self
    }

    /// 显式指定持久化协作者；未指定时在容器中按插槽查找
    pub fn with_persistence(mut self, provider: Arc<dyn PersistenceProvider>) -> Self {
        self.persistence = Some(provider);
        self
    }

    /// 显式指定 UI 协作者；未指定时在容器中按插槽查找
    pub fn with_ui_host(mut self, host: Arc<dyn UiHost>) -> Self {
        self.ui_host = Some(host);
        self
    }

    /// 容器
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// 启动配置
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// 当前阶段
    pub fn phase(&self) -> BootstrapPhase {
        *self.phase.read()
    }

    /// 启动结果（仅在 `Ready` 之后存在）
    pub fn outcome(&self) -> Option<Arc<BootstrapOutcome>> {
        self.outcome.read().clone()
    }

    /// 执行启动流程
    ///
    /// 并发调用会合并为一次执行；启动完成后再次调用直接返回同一个结果。
    pub fn run(&self, args: StartupArgs) -> InfrastructureResult<Arc<BootstrapOutcome>> {
        let _guard = self.run_lock.lock();

        match self.phase() {
            BootstrapPhase::Ready => {
                if let Some(outcome) = self.outcome() {
                    debug!("启动已完成，直接返回已有结果");
                    return Ok(outcome);
                }
            }
            BootstrapPhase::Idle => {}
            phase => {
                return Err(DependencyError::configuration(format!(
                    "bootstrap already attempted: 上一次启动停在 {phase}"
                ))
                .into());
            }
        }

        info!("开始启动: 应用根 {}", self.root.type_info().short_name());
        match self.execute(args) {
            Ok(outcome) => {
                let outcome = Arc::new(outcome);
                *self.outcome.write() = Some(Arc::clone(&outcome));
                self.enter(BootstrapPhase::Ready);
                info!("启动完成");
                Ok(outcome)
            }
            Err(e) => {
                error!(kind = e.kind(), "启动失败（阶段 {}）: {}", self.phase(), e);
                self.enter(BootstrapPhase::Failed);
                Err(e)
            }
        }
    }

    /// 重置启动器和容器，仅用于测试
    pub fn reset(&self) {
        let _guard = self.run_lock.lock();
        *self.outcome.write() = None;
        *self.phase.write() = BootstrapPhase::Idle;
        self.container.reset();
    }

    fn enter(&self, next: BootstrapPhase) {
        let mut phase = self.phase.write();
        debug!("启动阶段: {} -> {}", *phase, next);
        *phase = next;
    }

    fn execute(&self, args: StartupArgs) -> InfrastructureResult<BootstrapOutcome> {
        let options = StartupOptions::from_args(&args, &self.config);

        self.enter(BootstrapPhase::Scanning);
        let candidates = self.scan(&options)?;
        for component in &candidates {
            self.container.register_type(Arc::clone(component))?;
        }
        self.container
            .register_instance(StartupArgs::component_type(), Arc::new(args))?;

        self.enter(BootstrapPhase::RootConstruction);
        let application_root = self.construct_root()?;

        self.enter(BootstrapPhase::PersistenceHandoff);
        let persistence_initialized = self.hand_off_persistence(&application_root, &candidates)?;

        self.enter(BootstrapPhase::Wiring);
        self.wire_all()?;

        self.enter(BootstrapPhase::UiHandoff);
        let ui_initialized = if options.headless {
            info!("无界面模式，跳过 UI 交接");
            false
        } else {
            self.hand_off_ui(&application_root, &candidates)?
        };

        self.container.seal();
        let report = if self.config.report_diagnostics {
            self.container.diagnostics().flush()
        } else {
            self.container.diagnostics().take()
        };

        Ok(BootstrapOutcome {
            application_root,
            candidates,
            headless: options.headless,
            persistence_initialized,
            ui_initialized,
            report,
        })
    }

    /// 按服务标记查找候选类型并合并去重，再合并启动参数指定的配置标记类型
    fn scan(&self, options: &StartupOptions) -> InfrastructureResult<Vec<Arc<ComponentType>>> {
        let scope = self.config.scan_scope.as_deref();
        let mut seen: HashSet<TypeId> = HashSet::new();
        let mut candidates = Vec::new();

        for marker in Marker::SERVICE_MARKERS {
            for component in self.discovery.find_by_marker(marker, scope)? {
                if seen.insert(component.type_info().id) {
                    candidates.push(component);
                }
            }
        }

        for name in &options.config_markers {
            let component = self.discovery.find_by_name(name).ok_or_else(|| DependencyError::Discovery {
                message: format!("找不到配置标记类型: {name}"),
            })?;
            if seen.insert(component.type_info().id) {
                debug!("合并配置标记类型: {}", component.type_info().short_name());
                candidates.push(component);
            }
        }

        info!(
            "发现器 {} 找到 {} 个候选类型",
            self.discovery.name(),
            candidates.len()
        );
        Ok(candidates)
    }

    /// 构造应用根：实际选中的构造函数必须无参或只接受启动参数
    fn construct_root(&self) -> InfrastructureResult<ComponentRef> {
        let root = &self.root;
        let startup_args = TypeId::of::<StartupArgs>();
        let acceptable = match select_constructor(root)?.params() {
            [] => true,
            [only] => only.required.id == startup_args,
            _ => false,
        };
        if !acceptable {
            return Err(DependencyError::constructor_selection(
                root.type_info().name,
                "应用根只能使用无参构造函数或只接受启动参数的构造函数",
            )
            .into());
        }
        if root.scope() != Scope::Singleton {
            return Err(DependencyError::configuration(format!(
                "应用根 {} 必须是单例",
                root.type_info()
            ))
            .into());
        }

        self.container.register_type(Arc::clone(root))?;
        let application_root = self.container.construct(root)?;
        info!("应用根已构造: {}", root.type_info().short_name());
        Ok(application_root)
    }

    fn hand_off_persistence(
        &self,
        application_root: &ComponentRef,
        candidates: &[Arc<ComponentType>],
    ) -> InfrastructureResult<bool> {
        if !self.root.has_marker(Marker::Persistence) {
            debug!("应用根未声明持久化需求");
            return Ok(false);
        }

        let provider = match &self.persistence {
            Some(provider) => Some(Arc::clone(provider)),
            None => self.container.try_resolve::<dyn PersistenceProvider>()?,
        };
        let Some(provider) = provider else {
            warn!("未找到持久化协作者，跳过持久化交接");
            return Ok(false);
        };

        info!("交给持久化协作者: {}", provider.name());
        let handoff = PersistenceHandoff {
            application_root,
            candidates,
            registrar: &*self.container,
        };
        provider
            .initialize(&handoff)
            .map_err(|source| DependencyError::from_construction(provider.name(), source))?;
        Ok(true)
    }

    /// 解析并装配全部单例、非 UI 组件；每次请求组件按需创建，UI 组件留给 UI 协作者
    fn wire_all(&self) -> InfrastructureResult<()> {
        let components = self.container.components();
        let mut wired = 0usize;

        for component in &components {
            if component.scope() != Scope::Singleton || component.is_ui_bound() {
                debug!("跳过按需创建的组件: {}", component.type_info().short_name());
                continue;
            }
            self.container.resolve_component(component)?;
            wired += 1;
        }

        info!("装配完成: {} 个单例", wired);
        Ok(())
    }

    fn hand_off_ui(&self, application_root: &ComponentRef, candidates: &[Arc<ComponentType>]) -> InfrastructureResult<bool> {
        let ui_roots: Vec<_> = candidates
            .iter()
            .filter(|component| component.has_marker(Marker::UiRoot))
            .collect();

        let ui_root = match ui_roots.as_slice() {
            [] => {
                debug!("没有 UI 根，跳过 UI 交接");
                return Ok(false);
            }
            [only] => *only,
            _ => {
                let names: Vec<_> = ui_roots.iter().map(|c| c.type_info().short_name()).collect();
                return Err(DependencyError::configuration(format!(
                    "ambiguous UI root: {}",
                    names.join(", ")
                ))
                .into());
            }
        };

        let host = match &self.ui_host {
            Some(host) => Some(Arc::clone(host)),
            None => self.container.try_resolve::<dyn UiHost>()?,
        };
        let Some(host) = host else {
            warn!("未找到 UI 协作者，跳过 UI 交接");
            return Ok(false);
        };

        if !host.can_host(ui_root) {
            return Err(DependencyError::configuration(format!(
                "UI 协作者 {} 不能承载 UI 根 {}",
                host.name(),
                ui_root.type_info()
            ))
            .into());
        }

        info!("交给 UI 协作者: {} (UI 根 {})", host.name(), ui_root.type_info().short_name());
        let handoff = UiHandoff {
            ui_root,
            application_root,
            candidates,
            registrar: &*self.container,
        };
        host.initialize(&handoff)
            .map_err(|source| DependencyError::from_construction(host.name(), source))?;
        Ok(true)
    }
}
