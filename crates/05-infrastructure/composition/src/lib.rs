//! # 启动组合层
//!
//! 把发现、容器和外部协作者串成一次性的启动流程。
//!
//! ## 主要功能
//!
//! - **启动配置**: 默认值、TOML 文件和环境变量分层加载
//! - **日志初始化**: 基于 `tracing-subscriber`，支持文本和 JSON 输出
//! - **启动器**: 扫描、构造应用根、持久化交接、装配、UI 交接
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_impl::CatalogDiscovery;
//! use infrastructure_common::{ComponentType, StartupArgs};
//! use infrastructure_composition::{BootstrapConfig, Bootstrapper};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct App;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = ComponentType::builder::<App>().no_arg_constructor(App::default).build();
//!     let discovery = Arc::new(CatalogDiscovery::new("app"));
//!
//!     let bootstrapper = Bootstrapper::new(discovery, root, BootstrapConfig::load(None)?);
//!     let outcome = bootstrapper.run(StartupArgs::new(std::env::args().skip(1)))?;
//!     println!("装配记录: {}", outcome.report.len());
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod bootstrapper;
pub mod config;
pub mod logging;

pub use args::StartupOptions;
pub use bootstrapper::{BootstrapOutcome, BootstrapPhase, Bootstrapper};
pub use config::{BootstrapConfig, ENV_PREFIX};
pub use logging::{init_logging, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;

#[cfg(test)]
mod tests;
