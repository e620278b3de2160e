//! # Infrastructure Common
//!
//! 组件容器的公共模型和错误类型。
//!
//! ## 核心类型
//!
//! - [`ComponentType`] - 组件类型描述（能力、限定名、作用域、构造函数、注入点、钩子）
//! - [`ComponentRef`] - 组件实例引用，可转换为声明的任意能力
//! - [`Inject`] - 可注入字段槽位
//! - [`CapabilityKey`] - 能力查找键
//! - [`DependencyError`] - 解析和装配错误
//!
//! ## 设计原则
//!
//! - 组件描述在发现阶段一次性构建，解析阶段不做运行时反射
//! - 能力即 trait object（`dyn Trait`），通过 `TypeId` 查找
//! - 单例和每次请求两种作用域

pub mod component;
pub mod errors;
pub mod inject;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use inject::*;
pub use lifecycle::*;
pub use metadata::*;
