//! 组件生命周期管理

use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// 单例模式 - 整个进程生命周期内只创建一个实例，创建后永不替换
    #[default]
    Singleton,
    /// 每次解析都创建新实例，从不缓存
    PerRequest,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::PerRequest => f.write_str("per-request"),
        }
    }
}

/// 装配状态
///
/// 单例按类型跟踪，每次请求实例按实例跟踪。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WiringState {
    /// 尚未开始装配
    #[default]
    NotStarted,
    /// 装配中：已分配实例，依赖尚未全部注入
    InProgress,
    /// 装配完成：字段已注入且初始化钩子已执行
    Complete,
}

/// 执行上下文要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextRequirement {
    /// 任意线程
    #[default]
    Any,
    /// 只能在指定的 UI 事件线程上构造或解析
    UiThread,
}
