//! 启动参数中识别的选项

use crate::config::BootstrapConfig;
use infrastructure_common::StartupArgs;

/// 从启动参数和配置得到的启动选项
///
/// 原始参数不会被修改，仍然原样传给应用根。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupOptions {
    /// 是否跳过 UI 交接
    pub headless: bool,
    /// 需要额外合并进发现结果的配置标记类型名称
    pub config_markers: Vec<String>,
}

impl StartupOptions {
    /// 扫描启动参数；参数中的无界面标志与配置中的 `headless` 任一为真即为无界面模式
    pub fn from_args(args: &StartupArgs, config: &BootstrapConfig) -> Self {
        let mut config_markers: Vec<String> = Vec::new();
        for marker in args.values_with_prefix(&config.config_marker_prefix) {
            if !config_markers.iter().any(|existing| existing == marker) {
                config_markers.push(marker.to_string());
            }
        }

        Self {
            headless: config.headless || args.has_flag(&config.headless_flag),
            config_markers,
        }
    }
}
