//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义容器与外部协作者之间的契约。
//!
//! ## 核心接口
//!
//! - [`ComponentDiscovery`] - 组件发现协作者（按标记、按能力、按名称查找）
//! - [`ComponentResolver`] - 组件解析接口及其强类型扩展 [`TypedComponentResolver`]
//! - [`ComponentRegistrar`] - 启动期间协作者注册组件的接口
//! - [`PersistenceProvider`] / [`UiHost`] - 可选的持久化与 UI 协作者

pub mod container;
pub mod discovery;
pub mod plugins;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use discovery::*;
pub use plugins::*;
pub use registry::*;
pub use resolver::*;
