//! 启动配置
//!
//! 加载顺序：内置默认值、可选的 TOML 文件、`LORN_WIRING` 前缀的环境变量（层级分隔符 `__`）。

use config::{Config, Environment, File, FileFormat};
use di_abstractions::{ContainerConfig, CyclePolicy};
use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "LORN_WIRING";

/// 启动配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// 无界面模式，跳过 UI 交接
    pub headless: bool,
    /// 启动参数中表示无界面模式的标志
    pub headless_flag: String,
    /// 启动参数中指定额外配置标记类型的前缀
    pub config_marker_prefix: String,
    /// 发现范围（模块路径前缀）
    pub scan_scope: Option<String>,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 循环依赖处理策略
    pub cycle_policy: CyclePolicy,
    /// 启动结束时是否把装配报告输出到日志
    pub report_diagnostics: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        let container = ContainerConfig::default();
        Self {
            headless: false,
            headless_flag: "--headless".to_string(),
            config_marker_prefix: "--config-marker=".to_string(),
            scan_scope: None,
            max_resolution_depth: container.max_resolution_depth,
            cycle_policy: container.cycle_policy,
            report_diagnostics: true,
        }
    }
}

impl BootstrapConfig {
    /// 加载配置
    ///
    /// 显式给出的文件必须存在且可读。
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let defaults = toml::to_string(&Self::default()).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        let mut builder = Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            info!("加载启动配置文件: {}", path.display());
            let content = std::fs::read_to_string(path)?;
            builder = builder.add_source(File::from_str(&content, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        config.validate()?;
        debug!("启动配置: {:?}", config);
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        if self.headless_flag.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "headless_flag 不能为空".to_string(),
            });
        }
        if self.config_marker_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "config_marker_prefix 不能为空".to_string(),
            });
        }
        if self.scan_scope.as_deref().is_some_and(|scope| scope.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: "scan_scope 不能为空字符串".to_string(),
            });
        }
        Ok(())
    }

    /// 容器配置
    pub fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            max_resolution_depth: self.max_resolution_depth,
            cycle_policy: self.cycle_policy,
        }
    }
}
