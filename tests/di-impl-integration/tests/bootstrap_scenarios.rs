//! 启动流程的端到端场景

use di_abstractions::{TypedComponentResolver, UiHandoff, UiHost};
use di_impl::CatalogDiscovery;
use infrastructure_common::{BoxError, ComponentType, Inject, Marker, StartupArgs};
use infrastructure_composition::{BootstrapConfig, BootstrapPhase, Bootstrapper};
use parking_lot::Mutex;
use std::sync::Arc;

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Default)]
struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}")
    }
}

#[derive(Default)]
struct FrenchGreeter;

impl Greeter for FrenchGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {name}")
    }
}

#[derive(Default)]
struct Reception {
    en: Inject<dyn Greeter>,
}

#[derive(Default)]
struct ShopWindow;

#[derive(Default)]
struct OfficeWindow;

fn greeters() -> Vec<Arc<ComponentType>> {
    vec![
        ComponentType::builder::<EnglishGreeter>()
            .qualifier("en")
            .marker(Marker::Service)
            .provides::<dyn Greeter>(|g| g)
            .no_arg_constructor(EnglishGreeter::default)
            .build(),
        ComponentType::builder::<FrenchGreeter>()
            .qualifier("fr")
            .marker(Marker::Service)
            .provides::<dyn Greeter>(|g| g)
            .no_arg_constructor(FrenchGreeter::default)
            .build(),
    ]
}

fn ui_roots() -> Vec<Arc<ComponentType>> {
    vec![
        ComponentType::builder::<ShopWindow>()
            .marker(Marker::UiRoot)
            .no_arg_constructor(ShopWindow::default)
            .build(),
        ComponentType::builder::<OfficeWindow>()
            .marker(Marker::UiRoot)
            .no_arg_constructor(OfficeWindow::default)
            .build(),
    ]
}

fn reception() -> Arc<ComponentType> {
    ComponentType::builder::<Reception>()
        .no_arg_constructor(Reception::default)
        .field::<dyn Greeter>("en", |r| &r.en)
        .build()
}

/// 只记录调用的 UI 协作者
#[derive(Default)]
struct SpyHost {
    calls: Mutex<Vec<&'static str>>,
}

impl UiHost for SpyHost {
    fn name(&self) -> &str {
        "spy"
    }

    fn can_host(&self, _ui_root: &ComponentType) -> bool {
        self.calls.lock().push("can_host");
        true
    }

    fn initialize(&self, _handoff: &UiHandoff<'_>) -> Result<(), BoxError> {
        self.calls.lock().push("initialize");
        Ok(())
    }
}

fn bootstrapper(components: Vec<Arc<ComponentType>>, host: &Arc<SpyHost>) -> Bootstrapper {
    let discovery = Arc::new(CatalogDiscovery::new("scenario").with_components(components));
    Bootstrapper::new(discovery, reception(), BootstrapConfig::default())
        .with_ui_host(Arc::clone(host) as Arc<dyn UiHost>)
}

#[test]
fn test_field_name_selects_english_greeter() {
    let host = Arc::new(SpyHost::default());
    let bootstrapper = bootstrapper(greeters(), &host);

    let outcome = bootstrapper.run(StartupArgs::default()).unwrap();
    let reception = outcome.application_root.downcast::<Reception>().unwrap();
    assert_eq!(reception.en.get().unwrap().greet("Ada"), "Hello, Ada");
    assert!(bootstrapper.container().resolve_qualified::<dyn Greeter>("fr").is_ok());
}

#[test]
fn test_headless_never_contacts_ui_host() {
    let host = Arc::new(SpyHost::default());
    let mut components = greeters();
    components.extend(ui_roots());
    let bootstrapper = bootstrapper(components, &host);

    let outcome = bootstrapper.run(StartupArgs::new(["--headless"])).unwrap();
    assert_eq!(bootstrapper.phase(), BootstrapPhase::Ready);
    assert!(!outcome.ui_initialized);
    assert!(host.calls.lock().is_empty());
}

#[test]
fn test_headless_without_ui_root_reaches_ready() {
    let host = Arc::new(SpyHost::default());
    let bootstrapper = bootstrapper(greeters(), &host);

    bootstrapper.run(StartupArgs::new(["--headless"])).unwrap();
    assert_eq!(bootstrapper.phase(), BootstrapPhase::Ready);
    assert!(host.calls.lock().is_empty());
}

#[test]
fn test_ambiguous_ui_root_is_reported_before_host_contact() {
    let host = Arc::new(SpyHost::default());
    let mut components = greeters();
    components.extend(ui_roots());
    let bootstrapper = bootstrapper(components, &host);

    let err = bootstrapper.run(StartupArgs::default()).unwrap_err();
    assert_eq!(err.kind(), "ConfigurationError");
    assert!(err.to_string().contains("ambiguous UI root"));
    assert!(host.calls.lock().is_empty());
    assert_eq!(bootstrapper.phase(), BootstrapPhase::Failed);
}

#[test]
fn test_single_ui_root_is_hosted() {
    let host = Arc::new(SpyHost::default());
    let mut components = greeters();
    components.extend(ui_roots().into_iter().take(1));
    let bootstrapper = bootstrapper(components, &host);

    assert!(bootstrapper.run(StartupArgs::default()).unwrap().ui_initialized);
    assert_eq!(*host.calls.lock(), vec!["can_host", "initialize"]);
}
