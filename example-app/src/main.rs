//! # 示例应用程序
//!
//! 演示如何用组件容器和启动器装配一个问候应用。
//!
//! ```text
//! example-app -- Ada Grace
//! example-app --headless -- Ada
//! ```

mod greeter;

use anyhow::Context;
use clap::Parser;
use di_abstractions::TypedComponentResolver;
use di_impl::CatalogDiscovery;
use greeter::{ConsoleHost, GreeterApp, InMemoryPersistence};
use infrastructure_common::{DependencyError, InfrastructureError, StartupArgs};
use infrastructure_composition::{init_logging, BootstrapConfig, Bootstrapper, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn 组件容器示例应用")]
struct Args {
    /// 启动配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// 输出 JSON 格式日志
    #[arg(long)]
    json: bool,

    /// 无界面模式
    #[arg(long)]
    headless: bool,

    /// 原样传给应用根的启动参数
    #[arg(last = true)]
    startup_args: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let logging = LoggingConfig::default()
        .with_level(args.log_level)
        .with_json(args.json);
    if let Err(e) = init_logging(&logging) {
        eprintln!("日志初始化失败: {e}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = error_kind(&e), "示例应用启动失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = BootstrapConfig::load(args.config.as_deref())
        .map_err(InfrastructureError::from)
        .context("加载启动配置")?;
    config.headless |= args.headless;

    let discovery = Arc::new(CatalogDiscovery::new("example-app").with_components(greeter::catalog()));
    let bootstrapper = Bootstrapper::new(discovery, greeter::greeter_app(), config)
        .with_ui_host(Arc::new(ConsoleHost));

    // 持久化协作者通过容器插槽提供
    let container = bootstrapper.container();
    container.register_instance(greeter::in_memory_persistence(), Arc::new(InMemoryPersistence))?;
    container.designate_ui_thread()?;

    let outcome = bootstrapper.run(StartupArgs::new(args.startup_args))?;
    info!(
        "启动完成: {} 个候选类型, 持久化交接 {}, UI 交接 {}",
        outcome.candidates.len(),
        outcome.persistence_initialized,
        outcome.ui_initialized
    );

    let app = container.resolve::<GreeterApp>()?;
    for line in app.greetings() {
        println!("{line}");
    }
    Ok(())
}

/// 错误类别名称，用于退出前的日志
fn error_kind(error: &anyhow::Error) -> &'static str {
    if let Some(e) = error.downcast_ref::<InfrastructureError>() {
        return e.kind();
    }
    error
        .downcast_ref::<DependencyError>()
        .map_or("Unknown", DependencyError::kind)
}
