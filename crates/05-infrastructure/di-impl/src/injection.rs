//! 注入引擎
//!
//! 对已存在的实例注入字段并执行初始化钩子。装配是深度优先的：
//! 字段的值在赋值前已经完成自身的装配（循环中的装配中实例除外），
//! 实例自己的钩子在所有字段赋值之后才执行。

use crate::container::Container;
use crate::context::ResolveContext;
use crate::diagnostics::WiringEvent;
use infrastructure_common::{ComponentRef, DependencyError, DependencyResult, Scope, WiringState};
use tracing::{debug, trace, warn};

impl Container {
    /// 对实例执行字段注入和初始化钩子
    ///
    /// 已装配完成（单例按类型，每次请求实例按实例）的实例不会被再次注入，调用直接返回。
    pub fn inject(&self, target: &ComponentRef) -> DependencyResult<()> {
        let component = target.component();
        self.context.check(component)?;
        let _creation = self.creation.lock();

        if component.scope() == Scope::Singleton {
            if let Some((existing, _)) = self.store.lookup(component.type_info().id) {
                if !existing.ptr_eq(target) {
                    return Err(DependencyError::configuration(format!(
                        "{} 不是容器管理的单例实例",
                        component.type_info()
                    )));
                }
            }
        }

        let mut ctx = ResolveContext::new();
        ctx.enter(component.type_info(), self.config.max_resolution_depth)?;
        let result = self.wire(target, &mut ctx);
        ctx.leave();
        result
    }

    /// 装配实例：状态为 `NotStarted` 时置为 `InProgress`，注入全部字段、执行钩子后置为 `Complete`
    ///
    /// 失败时状态回到 `NotStarted`，错误原样返回。
    pub(crate) fn wire(&self, target: &ComponentRef, ctx: &mut ResolveContext) -> DependencyResult<()> {
        if !self.store.begin_wiring(target) {
            trace!("跳过已装配或装配中的实例: {:?}", target);
            return Ok(());
        }

        match self.fill(target, ctx) {
            Ok(()) => {
                self.store.complete(target);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "装配失败，放弃装配状态: {}: {}",
                    target.component().type_info().short_name(),
                    e
                );
                self.store.abandon(target);
                Err(e)
            }
        }
    }

    fn fill(&self, target: &ComponentRef, ctx: &mut ResolveContext) -> DependencyResult<()> {
        let component = target.component();
        let type_info = component.type_info();

        for point in component.injection_points() {
            let value = self.resolve_in(&point.key(), Some(&point.name), ctx)?;
            let partial = self.store.state_of(&value) == WiringState::InProgress;

            let assigned = point
                .assign(&**target.instance(), &value)
                .map_err(|message| DependencyError::InjectionFailed {
                    type_name: type_info.name.to_string(),
                    field: point.name.clone(),
                    message,
                })?;
            if !assigned {
                continue;
            }

            debug!(
                "注入字段: {}.{} <- {}",
                type_info.short_name(),
                point.name,
                value.component().type_info().short_name()
            );
            self.diagnostics.record(WiringEvent::FieldAssigned {
                component: type_info.short_name().to_string(),
                field: point.name.clone(),
                required: point.required.short_name().to_string(),
                resolved: value.component().type_info().short_name().to_string(),
                partial,
            });
        }

        for hook in component.hooks() {
            hook.invoke(&**target.instance())
                .map_err(|source| DependencyError::from_hook(type_info.name, hook.name.clone(), source))?;

            debug!("执行初始化钩子: {}::{}", type_info.short_name(), hook.name);
            self.diagnostics.record(WiringEvent::HookInvoked {
                component: type_info.short_name().to_string(),
                hook: hook.name.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Container;
    use di_abstractions::{ComponentResolver, ContainerConfig, CyclePolicy, TypedComponentResolver};
    use infrastructure_common::{ComponentRef, ComponentType, DependencyError, Inject, WiringState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Default)]
    struct EnglishGreeter;

    impl Greeter for EnglishGreeter {
        fn greet(&self) -> String {
            "Hello".to_string()
        }
    }

    #[derive(Default)]
    struct FrenchGreeter;

    impl Greeter for FrenchGreeter {
        fn greet(&self) -> String {
            "Bonjour".to_string()
        }
    }

    #[derive(Default)]
    struct Reception {
        en: Inject<dyn Greeter>,
        fr: Inject<dyn Greeter>,
        inits: AtomicUsize,
    }

    #[derive(Default)]
    struct Alpha {
        beta: Inject<Beta>,
        saw_beta_wired: std::sync::atomic::AtomicBool,
    }

    #[derive(Default)]
    struct Beta {
        alpha: Inject<Alpha>,
        saw_alpha_wired: std::sync::atomic::AtomicBool,
    }

    fn greeters(container: &Container) {
        container
            .register_type(
                ComponentType::builder::<EnglishGreeter>()
                    .qualifier("en")
                    .provides::<dyn Greeter>(|g| g)
                    .no_arg_constructor(EnglishGreeter::default)
                    .build(),
            )
            .unwrap();
        container
            .register_type(
                ComponentType::builder::<FrenchGreeter>()
                    .qualifier("fr")
                    .provides::<dyn Greeter>(|g| g)
                    .no_arg_constructor(FrenchGreeter::default)
                    .build(),
            )
            .unwrap();
    }

    fn reception() -> Arc<ComponentType> {
        ComponentType::builder::<Reception>()
            .no_arg_constructor(Reception::default)
            .field::<dyn Greeter>("en", |r| &r.en)
            .qualified_field::<dyn Greeter>("fr", "fr", |r| &r.fr)
            .post_construct("count_inits", |r: &Reception| {
                r.inits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }

    fn cycle(container: &Container) {
        container
            .register_type(
                ComponentType::builder::<Alpha>()
                    .no_arg_constructor(Alpha::default)
                    .field::<Beta>("beta", |a| &a.beta)
                    .post_construct("check", |a: &Alpha| {
                        let wired = a.beta.get().is_some_and(|b| b.alpha.is_wired());
                        a.saw_beta_wired.store(wired, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();
        container
            .register_type(
                ComponentType::builder::<Beta>()
                    .no_arg_constructor(Beta::default)
                    .field::<Alpha>("alpha", |b| &b.alpha)
                    .post_construct("check", |b: &Beta| {
                        let wired = b.alpha.get().is_some_and(|a| a.beta.is_wired());
                        b.saw_alpha_wired.store(wired, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();
    }

    #[test]
    fn test_field_name_and_qualifier_select_greeters() {
        let container = Container::new();
        greeters(&container);
        container.register_type(reception()).unwrap();

        let reception = container.resolve::<Reception>().unwrap();
        assert_eq!(reception.en.get().unwrap().greet(), "Hello");
        assert_eq!(reception.fr.get().unwrap().greet(), "Bonjour");
        assert_eq!(reception.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inject_twice_is_noop() {
        let container = Container::new();
        greeters(&container);
        container.register_type(reception()).unwrap();

        let component = container.components().into_iter().last().unwrap();
        let target = ComponentRef::new(Arc::new(Reception::default()), component);
        container.inject(&target).unwrap();
        container.inject(&target).unwrap();

        let reception = target.downcast::<Reception>().unwrap();
        assert_eq!(reception.inits.load(Ordering::SeqCst), 1);
        assert_eq!(container.diagnostics().report().hook_invocations().count(), 1);
        assert_eq!(container.diagnostics().report().field_assignments().count(), 2);
    }

    #[test]
    fn test_inject_rejects_foreign_singleton_instance() {
        let container = Container::new();
        greeters(&container);
        container.register_type(reception()).unwrap();
        let managed = container.resolve::<Reception>().unwrap();
        assert_eq!(managed.inits.load(Ordering::SeqCst), 1);

        let component = container.components().into_iter().last().unwrap();
        let foreign = ComponentRef::new(Arc::new(Reception::default()), component);
        assert!(matches!(
            container.inject(&foreign),
            Err(DependencyError::Configuration { .. })
        ));
    }

    #[test]
    fn test_field_cycle_returns_same_partially_wired_instance() {
        let container = Container::new();
        cycle(&container);

        let alpha = container.resolve::<Alpha>().unwrap();
        let beta = container.resolve::<Beta>().unwrap();

        assert!(Arc::ptr_eq(alpha.beta.get().unwrap(), &beta));
        assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &alpha));
        // Beta 的钩子运行时 Alpha 还在装配中
        assert!(!beta.saw_alpha_wired.load(Ordering::SeqCst));
        assert!(alpha.saw_beta_wired.load(Ordering::SeqCst));

        let partial: Vec<_> = container
            .diagnostics()
            .report()
            .lines()
            .into_iter()
            .filter(|line| line.ends_with("(partial)"))
            .collect();
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn test_reject_policy_fails_on_field_cycle() {
        let container = Container::with_config(ContainerConfig {
            cycle_policy: CyclePolicy::Reject,
            ..ContainerConfig::default()
        });
        cycle(&container);

        match container.resolve::<Alpha>() {
            Err(DependencyError::CircularDependency { dependency_chain }) => {
                assert_eq!(dependency_chain, "Alpha -> Beta -> Alpha");
            }
            other => panic!("应该检测到循环依赖: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_self_referencing_per_request_exceeds_depth() {
        #[derive(Default)]
        struct Node {
            next: Inject<Node>,
        }

        let container = Container::with_config(ContainerConfig {
            max_resolution_depth: 8,
            ..ContainerConfig::default()
        });
        container
            .register_type(
                ComponentType::builder::<Node>()
                    .per_request()
                    .no_arg_constructor(Node::default)
                    .field::<Node>("next", |n| &n.next)
                    .build(),
            )
            .unwrap();

        assert!(matches!(
            container.resolve::<Node>(),
            Err(DependencyError::ResolutionDepthExceeded { max_depth: 8, .. })
        ));
    }

    #[test]
    fn test_hook_failure_is_reported_with_hook_name() {
        #[derive(Default)]
        struct Faulty;

        let container = Container::new();
        container
            .register_type(
                ComponentType::builder::<Faulty>()
                    .no_arg_constructor(Faulty::default)
                    .post_construct("open", |_f: &Faulty| Err("端口被占用".into()))
                    .build(),
            )
            .unwrap();

        match container.resolve::<Faulty>() {
            Err(DependencyError::HookFailed { hook, .. }) => assert_eq!(hook, "open"),
            other => panic!("意外的结果: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_failed_wiring_is_reported_again_on_next_resolution() {
        trait Missing: Send + Sync {}

        #[derive(Default)]
        struct Faulty {
            attempts: AtomicUsize,
        }

        #[derive(Default)]
        struct NeedsMissing {
            dep: Inject<dyn Missing>,
            inits: AtomicUsize,
        }

        let faulty = ComponentType::builder::<Faulty>()
            .no_arg_constructor(Faulty::default)
            .post_construct("open", |f: &Faulty| {
                f.attempts.fetch_add(1, Ordering::SeqCst);
                Err("端口被占用".into())
            })
            .build();
        let needs_missing = ComponentType::builder::<NeedsMissing>()
            .no_arg_constructor(NeedsMissing::default)
            .field::<dyn Missing>("dep", |n| &n.dep)
            .post_construct("init", |n: &NeedsMissing| {
                n.inits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        let container = Container::new();
        container.register_type(Arc::clone(&faulty)).unwrap();
        container.register_type(Arc::clone(&needs_missing)).unwrap();

        for _ in 0..2 {
            let err = container.resolve::<Faulty>().map(|_| ()).unwrap_err();
            assert_eq!(err.kind(), "HookFailed");
            let err = container.resolve::<NeedsMissing>().map(|_| ()).unwrap_err();
            assert_eq!(err.kind(), "CapabilityNotFound");
        }

        let stored = container.construct(&faulty).unwrap();
        assert_eq!(container.wiring_state(&stored), WiringState::NotStarted);
        assert_eq!(stored.downcast::<Faulty>().unwrap().attempts.load(Ordering::SeqCst), 2);

        let stored = container.construct(&needs_missing).unwrap();
        assert_eq!(container.wiring_state(&stored), WiringState::NotStarted);
        let needs_missing = stored.downcast::<NeedsMissing>().unwrap();
        assert!(!needs_missing.dep.is_wired());
        assert_eq!(needs_missing.inits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wiring_completes_once_the_failure_is_gone() {
        #[derive(Default)]
        struct Flaky {
            greeter: Inject<dyn Greeter>,
            attempts: AtomicUsize,
        }

        let container = Container::new();
        container
            .register_type(
                ComponentType::builder::<Flaky>()
                    .no_arg_constructor(Flaky::default)
                    .field::<dyn Greeter>("greeter", |f| &f.greeter)
                    .post_construct("connect", |f: &Flaky| {
                        match f.attempts.fetch_add(1, Ordering::SeqCst) {
                            0 => Err("暂时不可用".into()),
                            _ => Ok(()),
                        }
                    })
                    .build(),
            )
            .unwrap();
        container
            .register_type(
                ComponentType::builder::<EnglishGreeter>()
                    .provides::<dyn Greeter>(|g| g)
                    .no_arg_constructor(EnglishGreeter::default)
                    .build(),
            )
            .unwrap();

        assert!(container.resolve::<Flaky>().is_err());
        let flaky = container.resolve::<Flaky>().unwrap();
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(flaky.greeter.get().unwrap().greet(), "Hello");
        assert_eq!(container.diagnostics().report().field_assignments().count(), 1);
    }

    #[test]
    fn test_hooks_run_in_declaration_order_after_fields() {
        #[derive(Default)]
        struct Ordered {
            greeter: Inject<dyn Greeter>,
            log: parking_lot::Mutex<Vec<String>>,
        }

        let container = Container::new();
        container
            .register_type(
                ComponentType::builder::<EnglishGreeter>()
                    .provides::<dyn Greeter>(|g| g)
                    .no_arg_constructor(EnglishGreeter::default)
                    .build(),
            )
            .unwrap();
        container
            .register_type(
                ComponentType::builder::<Ordered>()
                    .no_arg_constructor(Ordered::default)
                    .field::<dyn Greeter>("greeter", |o| &o.greeter)
                    .post_construct("first", |o: &Ordered| {
                        o.log.lock().push(format!("first:{}", o.greeter.is_wired()));
                        Ok(())
                    })
                    .post_construct("second", |o: &Ordered| {
                        o.log.lock().push("second".to_string());
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();

        let ordered = container.resolve::<Ordered>().unwrap();
        assert_eq!(*ordered.log.lock(), vec!["first:true", "second"]);

        let target = container
            .resolve_key(&infrastructure_common::CapabilityKey::of::<Ordered>(), None)
            .unwrap();
        assert_eq!(container.wiring_state(&target), WiringState::Complete);
    }
}
