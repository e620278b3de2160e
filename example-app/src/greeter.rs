//! 问候应用的组件

use di_abstractions::{
    PersistenceHandoff, PersistenceProvider, TypedComponentResolver, UiHandoff, UiHost,
};
use infrastructure_common::{
    BoxError, ComponentType, ConstructorArgs, Inject, Marker, Parameter, StartupArgs,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// 问候语
pub trait Greeter: Send + Sync {
    /// 生成问候语
    fn greet(&self, name: &str) -> String;
}

/// 访客登记簿
pub trait GuestBook: Send + Sync {
    /// 登记访客
    fn sign(&self, name: &str);

    /// 已登记的访客
    fn guests(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

#[derive(Default)]
pub struct FrenchGreeter;

impl Greeter for FrenchGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {name} !")
    }
}

/// 内存中的登记簿，由持久化协作者注册
#[derive(Default)]
pub struct MemoryGuestBook {
    guests: Mutex<Vec<String>>,
}

impl GuestBook for MemoryGuestBook {
    fn sign(&self, name: &str) {
        let mut guests = self.guests.lock();
        if !guests.iter().any(|guest| guest == name) {
            guests.push(name.to_string());
        }
    }

    fn guests(&self) -> Vec<String> {
        self.guests.lock().clone()
    }
}

/// 应用根
///
/// 启动参数中不以 `--` 开头的值视为访客名。
pub struct GreeterApp {
    args: Arc<StartupArgs>,
    pub en: Inject<dyn Greeter>,
    pub guest_book: Inject<dyn GuestBook>,
}

impl GreeterApp {
    fn sign_guests(&self) -> Result<(), BoxError> {
        let book = self.guest_book.get().ok_or("登记簿未注入")?;
        for name in self.args.as_slice().iter().filter(|arg| !arg.starts_with("--")) {
            book.sign(name);
        }
        Ok(())
    }

    /// 用英文问候全部访客
    pub fn greetings(&self) -> Vec<String> {
        let (Some(greeter), Some(book)) = (self.en.get(), self.guest_book.get()) else {
            return Vec::new();
        };
        book.guests().iter().map(|name| greeter.greet(name)).collect()
    }
}

/// UI 根：用法文问候
#[derive(Default)]
pub struct MainWindow {
    pub greeter: Inject<dyn Greeter>,
    pub guest_book: Inject<dyn GuestBook>,
}

impl MainWindow {
    /// 渲染窗口内容
    pub fn render(&self) -> Vec<String> {
        let (Some(greeter), Some(book)) = (self.greeter.get(), self.guest_book.get()) else {
            return Vec::new();
        };
        book.guests().iter().map(|name| format!("[window] {}", greeter.greet(name))).collect()
    }
}

/// 把登记簿注册进容器的持久化协作者
pub struct InMemoryPersistence;

impl PersistenceProvider for InMemoryPersistence {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn initialize(&self, handoff: &PersistenceHandoff<'_>) -> Result<(), BoxError> {
        handoff.registrar.register_type(
            ComponentType::builder::<MemoryGuestBook>()
                .marker(Marker::Repository)
                .provides::<dyn GuestBook>(|b| b)
                .no_arg_constructor(MemoryGuestBook::default)
                .build(),
        )?;
        info!("登记簿已注册");
        Ok(())
    }
}

/// 在控制台中承载 UI 根
pub struct ConsoleHost;

impl UiHost for ConsoleHost {
    fn name(&self) -> &str {
        "console"
    }

    fn can_host(&self, ui_root: &ComponentType) -> bool {
        ui_root.type_info().id == std::any::TypeId::of::<MainWindow>()
    }

    fn initialize(&self, handoff: &UiHandoff<'_>) -> Result<(), BoxError> {
        let window = handoff.registrar.resolve::<MainWindow>()?;
        for line in window.render() {
            println!("{line}");
        }
        Ok(())
    }
}

pub fn english() -> Arc<ComponentType> {
    ComponentType::builder::<EnglishGreeter>()
        .qualifier("en")
        .marker(Marker::Service)
        .provides::<dyn Greeter>(|g| g)
        .no_arg_constructor(EnglishGreeter::default)
        .build()
}

pub fn french() -> Arc<ComponentType> {
    ComponentType::builder::<FrenchGreeter>()
        .qualifier("fr")
        .marker(Marker::Service)
        .provides::<dyn Greeter>(|g| g)
        .no_arg_constructor(FrenchGreeter::default)
        .build()
}

pub fn main_window() -> Arc<ComponentType> {
    ComponentType::builder::<MainWindow>()
        .marker(Marker::UiRoot)
        .ui_bound()
        .no_arg_constructor(MainWindow::default)
        .qualified_field::<dyn Greeter>("greeter", "fr", |w| &w.greeter)
        .field::<dyn GuestBook>("guest_book", |w| &w.guest_book)
        .build()
}

pub fn in_memory_persistence() -> Arc<ComponentType> {
    ComponentType::builder::<InMemoryPersistence>()
        .provides::<dyn PersistenceProvider>(|p| p)
        .build()
}

pub fn greeter_app() -> Arc<ComponentType> {
    ComponentType::builder::<GreeterApp>()
        .marker(Marker::Persistence)
        .constructor(
            vec![Parameter::of::<StartupArgs>("args")],
            |args: &mut ConstructorArgs| {
                Ok(GreeterApp {
                    args: args.take::<StartupArgs>(0)?,
                    en: Inject::default(),
                    guest_book: Inject::default(),
                })
            },
        )
        .field::<dyn Greeter>("en", |app| &app.en)
        .field::<dyn GuestBook>("guest_book", |app| &app.guest_book)
        .post_construct("sign_guests", GreeterApp::sign_guests)
        .build()
}

/// 全部可发现的组件
pub fn catalog() -> Vec<Arc<ComponentType>> {
    vec![english(), french(), main_window()]
}
