//! 可注入字段

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 可注入字段槽位
///
/// 组件把依赖声明为 `Inject<dyn Trait>` 或 `Inject<Concrete>` 字段，容器在
/// 注入阶段写入一次。循环依赖下，依赖方可能在本字段写入之前就观察到组件，
/// 此时 [`Inject::get`] 返回 `None`。
pub struct Inject<C: ?Sized> {
    cell: OnceCell<Arc<C>>,
}

impl<C: ?Sized> Inject<C> {
    /// 创建空槽位
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 获取已注入的值
    pub fn get(&self) -> Option<&Arc<C>> {
        self.cell.get()
    }

    /// 是否已注入
    pub fn is_wired(&self) -> bool {
        self.cell.get().is_some()
    }

    /// 写入值，槽位已有值时返回 `false` 且不覆盖
    pub fn set(&self, value: Arc<C>) -> bool {
        self.cell.set(value).is_ok()
    }
}

impl<C: ?Sized> Default for Inject<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> fmt::Debug for Inject<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<C>())
            .field("wired", &self.is_wired())
            .finish()
    }
}
