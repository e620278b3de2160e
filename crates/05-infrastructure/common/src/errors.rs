//! 错误类型定义

use thiserror::Error;

/// 装箱的底层错误（构造函数、钩子、协作者返回的错误）
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖注入错误类型
///
/// 启动期间出现的任何一种都是致命错误，启动流程会立即中止。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("未找到能力的实现: {capability}")]
    CapabilityNotFound { capability: String },

    #[error("能力存在多个实现且无法消歧: {capability}, 候选: {candidates:?}")]
    AmbiguousCapability {
        capability: String,
        candidates: Vec<String>,
    },

    #[error("无法选择构造函数: {type_name}, 原因: {message}")]
    ConstructorSelection { type_name: String, message: String },

    #[error("非法执行上下文: {type_name} 只能在 UI 线程上解析")]
    IllegalContext { type_name: String },

    #[error("配置错误: {message}")]
    Configuration { message: String },

    #[error("组件发现失败: {message}")]
    Discovery { message: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("解析深度超过上限 {max_depth}: {type_name}")]
    ResolutionDepthExceeded { type_name: String, max_depth: usize },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: BoxError,
    },

    #[error("字段注入失败: {type_name}.{field}, 原因: {message}")]
    InjectionFailed {
        type_name: String,
        field: String,
        message: String,
    },

    #[error("初始化钩子执行失败: {type_name}::{hook}, 原因: {source}")]
    HookFailed {
        type_name: String,
        hook: String,
        source: BoxError,
    },
}

impl DependencyError {
    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// 创建构造函数选择错误
    pub fn constructor_selection(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstructorSelection {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 包装底层构造错误
    ///
    /// 如果底层错误本身就是 `DependencyError`，原样返回（只解包一层），
    /// 调用方看到的是真正的失败原因而不是通用包装。
    pub fn from_construction(type_name: impl Into<String>, source: BoxError) -> Self {
        match source.downcast::<Self>() {
            Ok(inner) => *inner,
            Err(source) => Self::ComponentCreationFailed {
                type_name: type_name.into(),
                source,
            },
        }
    }

    /// 包装钩子执行错误，规则同 [`DependencyError::from_construction`]
    pub fn from_hook(type_name: impl Into<String>, hook: impl Into<String>, source: BoxError) -> Self {
        match source.downcast::<Self>() {
            Ok(inner) => *inner,
            Err(source) => Self::HookFailed {
                type_name: type_name.into(),
                hook: hook.into(),
                source,
            },
        }
    }

    /// 稳定的错误类别名称，用于日志和退出报告
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapabilityNotFound { .. } => "CapabilityNotFound",
            Self::AmbiguousCapability { .. } => "AmbiguousCapability",
            Self::ConstructorSelection { .. } => "ConstructorSelectionError",
            Self::IllegalContext { .. } => "IllegalContext",
            Self::Configuration { .. } => "ConfigurationError",
            Self::Discovery { .. } => "DiscoveryError",
            Self::CircularDependency { .. } => "CircularDependency",
            Self::ResolutionDepthExceeded { .. } => "ResolutionDepthExceeded",
            Self::ComponentCreationFailed { .. } => "ConstructionFailed",
            Self::InjectionFailed { .. } => "InjectionFailed",
            Self::HookFailed { .. } => "HookFailed",
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

impl InfrastructureError {
    /// 错误类别名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } => "ConfigError",
            Self::DependencyError { source } => source.kind(),
            Self::BootstrapFailed { .. } => "BootstrapFailed",
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_error_unwraps_dependency_error() {
        let inner: BoxError = Box::new(DependencyError::CapabilityNotFound {
            capability: "dyn Greeter".to_string(),
        });

        let err = DependencyError::from_construction("App", inner);
        assert!(matches!(err, DependencyError::CapabilityNotFound { .. }));
        assert_eq!(err.kind(), "CapabilityNotFound");
    }

    #[test]
    fn test_construction_error_wraps_foreign_error() {
        let inner: BoxError = Box::new(std::io::Error::new(std::io::ErrorKind::Other, "磁盘已满"));

        let err = DependencyError::from_construction("App", inner);
        match err {
            DependencyError::ComponentCreationFailed { type_name, source } => {
                assert_eq!(type_name, "App");
                assert_eq!(source.to_string(), "磁盘已满");
            }
            other => panic!("意外的错误类型: {other:?}"),
        }
    }
}
