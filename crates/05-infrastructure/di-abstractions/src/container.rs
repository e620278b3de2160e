//! 容器配置

use serde::{Deserialize, Serialize};

/// 循环依赖处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePolicy {
    /// 字段层面的循环返回装配中的实例（可能尚有字段未注入）
    #[default]
    Tolerate,
    /// 重入装配中的组件立即失败
    Reject,
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 循环依赖处理策略
    pub cycle_policy: CyclePolicy,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 100,
            cycle_policy: CyclePolicy::Tolerate,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// 已注册组件类型数量
    pub registered_components: usize,
    /// 已注册能力数量
    pub registered_capabilities: usize,
    /// 活跃单例数量
    pub active_singletons: usize,
    /// 已装配完成的单例数量
    pub wired_singletons: usize,
}
