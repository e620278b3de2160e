//! 执行上下文与解析上下文

use infrastructure_common::{ComponentType, DependencyError, DependencyResult, TypeInfo};
use parking_lot::RwLock;
use std::thread::{self, ThreadId};
use tracing::info;

/// 执行上下文
///
/// 记录被指定为 UI 事件线程的线程。UI 组件只能在该线程上构造或解析，
/// 在其他线程上解析会立即失败，不会排队等待。
#[derive(Debug, Default)]
pub struct ExecutionContext {
    ui_thread: RwLock<Option<ThreadId>>,
}

impl ExecutionContext {
    /// 创建执行上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 把当前线程指定为 UI 线程
    ///
    /// 已指定为其他线程时失败，重复指定同一线程是幂等的。
    pub fn designate_ui_thread(&self) -> DependencyResult<()> {
        let current = thread::current().id();
        let mut ui_thread = self.ui_thread.write();

        match *ui_thread {
            Some(existing) if existing != current => Err(DependencyError::configuration(format!(
                "UI 线程已被指定为 {existing:?}，不能再指定为 {current:?}"
            ))),
            Some(_) => Ok(()),
            None => {
                info!("指定 UI 线程: {:?}", current);
                *ui_thread = Some(current);
                Ok(())
            }
        }
    }

    /// 当前线程是否为 UI 线程
    pub fn is_ui_thread(&self) -> bool {
        *self.ui_thread.read() == Some(thread::current().id())
    }

    /// UI 线程
    pub fn ui_thread(&self) -> Option<ThreadId> {
        *self.ui_thread.read()
    }

    /// 检查组件能否在当前线程上解析
    pub fn check(&self, component: &ComponentType) -> DependencyResult<()> {
        if component.is_ui_bound() && !self.is_ui_thread() {
            return Err(DependencyError::IllegalContext {
                type_name: component.type_info().name.to_string(),
            });
        }
        Ok(())
    }

    /// 清除 UI 线程指定
    pub fn clear(&self) {
        *self.ui_thread.write() = None;
    }
}

/// 单次解析的上下文
///
/// 跟踪当前的解析路径和正在执行构造函数的类型链。每次顶层解析都使用新的上下文。
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 解析路径，长度即当前递归深度
    path: Vec<TypeInfo>,
    /// 正在构造的类型链，用于检测构造函数层面的循环依赖
    construction_chain: Vec<TypeInfo>,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 进入一层解析，超过深度上限时失败且不进入
    pub fn enter(&mut self, type_info: TypeInfo, max_depth: usize) -> DependencyResult<()> {
        if self.path.len() >= max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                type_name: type_info.name.to_string(),
                max_depth,
            });
        }
        self.path.push(type_info);
        Ok(())
    }

    /// 离开一层解析
    pub fn leave(&mut self) {
        self.path.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// 以 `A -> B -> A` 的形式描述当前解析路径
    pub fn describe_path(&self) -> String {
        join(self.path.iter())
    }

    /// 添加类型到构造链
    pub fn push_type(&mut self, type_info: TypeInfo) -> DependencyResult<()> {
        if self.construction_chain.contains(&type_info) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: join(self.construction_chain.iter().chain(std::iter::once(&type_info))),
            });
        }
        self.construction_chain.push(type_info);
        Ok(())
    }

    /// 从构造链中移除类型
    pub fn pop_type(&mut self) {
        self.construction_chain.pop();
    }
}

fn join<'a>(types: impl Iterator<Item = &'a TypeInfo>) -> String {
    types.map(TypeInfo::short_name).collect::<Vec<_>>().join(" -> ")
}
