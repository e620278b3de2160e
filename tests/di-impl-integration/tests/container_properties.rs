//! 容器解析和装配性质的集中测试

use di_abstractions::{ContainerConfig, CyclePolicy, TypedComponentResolver};
use di_impl::Container;
use infrastructure_common::{ComponentType, DependencyError, Inject, Marker, WiringState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Codec: Send + Sync {
    fn id(&self) -> &'static str;
}

#[derive(Default)]
struct Alpha;

impl Codec for Alpha {
    fn id(&self) -> &'static str {
        "alpha"
    }
}

#[derive(Default)]
struct Beta;

impl Codec for Beta {
    fn id(&self) -> &'static str {
        "beta"
    }
}

#[derive(Default)]
struct Ticket;

fn alpha() -> Arc<ComponentType> {
    ComponentType::builder::<Alpha>()
        .qualifier("a")
        .marker(Marker::Service)
        .provides::<dyn Codec>(|c| c)
        .no_arg_constructor(Alpha::default)
        .build()
}

fn beta() -> Arc<ComponentType> {
    ComponentType::builder::<Beta>()
        .qualifier("b")
        .marker(Marker::Service)
        .provides::<dyn Codec>(|c| c)
        .no_arg_constructor(Beta::default)
        .build()
}

#[test]
fn test_singleton_resolution_is_identical() {
    let container = Container::new();
    container.register_type(alpha()).unwrap();

    for _ in 0..3 {
        let first = container.resolve::<Alpha>().unwrap();
        let second = container.resolve::<dyn Codec>().unwrap();
        assert!(std::ptr::eq(
            Arc::as_ptr(&first).cast::<()>(),
            Arc::as_ptr(&second).cast::<()>()
        ));
    }
}

#[test]
fn test_per_request_resolution_is_fresh() {
    let container = Container::new();
    container
        .register_type(
            ComponentType::builder::<Ticket>()
                .per_request()
                .no_arg_constructor(Ticket::default)
                .build(),
        )
        .unwrap();

    let first = container.resolve::<Ticket>().unwrap();
    let second = container.resolve::<Ticket>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(container.stats().active_singletons, 0);
}

#[test]
fn test_qualifier_selects_implementation() {
    let container = Container::new();
    container.register_type(alpha()).unwrap();
    container.register_type(beta()).unwrap();

    assert_eq!(container.resolve_qualified::<dyn Codec>("b").unwrap().id(), "beta");
    assert_eq!(container.resolve_qualified::<dyn Codec>("a").unwrap().id(), "alpha");
    assert!(matches!(
        container.resolve::<dyn Codec>(),
        Err(DependencyError::AmbiguousCapability { .. })
    ));
}

#[test]
fn test_single_candidate_ignores_qualifier() {
    let container = Container::new();
    container.register_type(alpha()).unwrap();

    assert_eq!(container.resolve::<dyn Codec>().unwrap().id(), "alpha");
    assert_eq!(container.resolve_qualified::<dyn Codec>("zzz").unwrap().id(), "alpha");
    assert_eq!(container.resolve_named::<dyn Codec>("other").unwrap().id(), "alpha");
}

#[test]
fn test_unregistered_capability_is_not_found() {
    let container = Container::new();
    assert!(matches!(
        container.resolve::<dyn Codec>(),
        Err(DependencyError::CapabilityNotFound { .. })
    ));
    assert!(container.try_resolve::<dyn Codec>().unwrap().is_none());
}

trait Left: Send + Sync {
    fn right(&self) -> Option<Arc<dyn Right>>;
}

trait Right: Send + Sync {
    fn left(&self) -> Option<Arc<dyn Left>>;
}

#[derive(Default)]
struct LeftImpl {
    right: Inject<dyn Right>,
}

impl Left for LeftImpl {
    fn right(&self) -> Option<Arc<dyn Right>> {
        self.right.get().cloned()
    }
}

#[derive(Default)]
struct RightImpl {
    left: Inject<dyn Left>,
}

impl Right for RightImpl {
    fn left(&self) -> Option<Arc<dyn Left>> {
        self.left.get().cloned()
    }
}

fn cyclic_container(config: ContainerConfig) -> Container {
    let container = Container::with_config(config);
    container
        .register_type(
            ComponentType::builder::<LeftImpl>()
                .provides::<dyn Left>(|l| l)
                .no_arg_constructor(LeftImpl::default)
                .field::<dyn Right>("right", |l| &l.right)
                .build(),
        )
        .unwrap();
    container
        .register_type(
            ComponentType::builder::<RightImpl>()
                .provides::<dyn Right>(|r| r)
                .no_arg_constructor(RightImpl::default)
                .field::<dyn Left>("left", |r| &r.left)
                .build(),
        )
        .unwrap();
    container
}

#[test]
fn test_field_cycle_is_contained() {
    let container = cyclic_container(ContainerConfig::default());

    let left = container.resolve::<LeftImpl>().unwrap();
    let right = left.right().unwrap();
    let inner_left = right.left().unwrap();

    // 内层引用就是最终的同一个实例
    assert!(std::ptr::eq(
        Arc::as_ptr(&inner_left).cast::<()>(),
        Arc::as_ptr(&left).cast::<()>()
    ));
    assert!(inner_left.right().is_some());

    let report = container.diagnostics().report();
    let partial = report.lines().into_iter().filter(|line| line.ends_with("(partial)")).count();
    assert_eq!(partial, 1);
}

#[test]
fn test_field_cycle_rejected_when_configured() {
    let container = cyclic_container(ContainerConfig {
        cycle_policy: CyclePolicy::Reject,
        ..ContainerConfig::default()
    });

    match container.resolve::<LeftImpl>() {
        Err(DependencyError::CircularDependency { dependency_chain }) => {
            assert!(dependency_chain.starts_with("LeftImpl"));
            assert!(dependency_chain.ends_with("LeftImpl"));
        }
        other => panic!("应该检测到循环依赖: {:?}", other.map(|_| ())),
    }
}

#[derive(Default)]
struct Counted {
    codec: Inject<dyn Codec>,
    hooks: AtomicUsize,
}

#[test]
fn test_injection_is_idempotent() {
    let container = Container::new();
    container.register_type(alpha()).unwrap();
    let counted = ComponentType::builder::<Counted>()
        .no_arg_constructor(Counted::default)
        .field::<dyn Codec>("codec", |c| &c.codec)
        .post_construct("count", |c: &Counted| {
            c.hooks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();
    container.register_type(Arc::clone(&counted)).unwrap();

    let instance = container.construct(&counted).unwrap();
    assert_eq!(container.wiring_state(&instance), WiringState::NotStarted);

    container.inject(&instance).unwrap();
    container.inject(&instance).unwrap();
    container.resolve::<Counted>().unwrap();

    let typed = instance.downcast::<Counted>().unwrap();
    assert_eq!(typed.hooks.load(Ordering::SeqCst), 1);
    assert_eq!(typed.codec.get().unwrap().id(), "alpha");
    assert_eq!(container.wiring_state(&instance), WiringState::Complete);

    let report = container.diagnostics().report();
    assert_eq!(report.field_assignments().count(), 1);
    assert_eq!(report.hook_invocations().count(), 1);
}
