//! # 依赖注入具体实现
//!
//! 提供组件容器及其组成部分：
//!
//! - [`CapabilityRegistry`] - 能力注册表，把请求的类型加可选名称映射到唯一实现
//! - [`InstanceStore`] - 实例存储，缓存单例并跟踪装配状态
//! - 实例化引擎与注入引擎（[`Container`] 上的方法）
//! - [`WiringDiagnostics`] - 装配诊断日志
//! - [`ExecutionContext`] / [`ResolveContext`] - UI 线程约束与单次解析的循环检测
//! - [`CatalogDiscovery`] - 静态注册的组件目录
//!
//! ```rust
//! use di_impl::Container;
//! use di_abstractions::TypedComponentResolver;
//! use infrastructure_common::ComponentType;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         7
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .register_type(
//!         ComponentType::builder::<FixedClock>()
//!             .provides::<dyn Clock>(|c| c)
//!             .no_arg_constructor(|| FixedClock)
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let clock = container.resolve::<dyn Clock>().unwrap();
//! assert_eq!(clock.now(), 7);
//! ```

pub mod container;
pub mod context;
pub mod diagnostics;
pub mod discovery;
pub mod injection;
pub mod instantiation;
pub mod registry;
pub mod store;

pub use container::Container;
pub use context::{ExecutionContext, ResolveContext};
pub use diagnostics::{DiagnosticEntry, WiringDiagnostics, WiringEvent, WiringReport};
pub use discovery::CatalogDiscovery;
pub use instantiation::select_constructor;
pub use registry::{BindingInfo, CapabilityRegistry};
pub use store::InstanceStore;
