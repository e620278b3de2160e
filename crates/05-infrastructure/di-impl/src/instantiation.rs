//! 实例化引擎
//!
//! 选择构造函数、解析构造参数并调用构造函数。

use crate::container::Container;
use crate::context::ResolveContext;
use crate::diagnostics::WiringEvent;
use infrastructure_common::{
    ComponentRef, ComponentType, Constructor, ConstructorArgs, DependencyError, DependencyResult, Instance,
};
use std::sync::Arc;
use tracing::debug;

/// 选择构造函数
///
/// 顺序：
/// 1. 存在无参构造函数时使用它
/// 2. 只有一个构造函数时使用它
/// 3. 多个构造函数时使用唯一被标记的那个；标记多个是配置错误，没有标记则无法选择
pub fn select_constructor(component: &ComponentType) -> DependencyResult<&Constructor> {
    let type_name = component.type_info().name;
    let constructors = component.constructors();

    if let Some(no_arg) = constructors.iter().find(|constructor| constructor.arity() == 0) {
        return Ok(no_arg);
    }

    match constructors {
        [] => Err(DependencyError::constructor_selection(type_name, "没有声明构造函数")),
        [only] => Ok(only),
        _ => {
            let mut marked = constructors.iter().filter(|constructor| constructor.is_marked());
            match (marked.next(), marked.next()) {
                (Some(only), None) => Ok(only),
                (Some(_), Some(_)) => Err(DependencyError::configuration(format!(
                    "{type_name} 有多个被标记的注入构造函数"
                ))),
                (None, _) => Err(DependencyError::constructor_selection(
                    type_name,
                    format!("存在 {} 个构造函数但没有被标记的注入构造函数", constructors.len()),
                )),
            }
        }
    }
}

impl Container {
    /// 创建组件实例，不执行字段注入
    ///
    /// 参数类型不是已注册的能力或具体类型时，在调用任何构造函数之前失败。
    pub(crate) fn instantiate(&self, component: &Arc<ComponentType>, ctx: &mut ResolveContext) -> DependencyResult<Instance> {
        let type_info = component.type_info();
        let constructor = select_constructor(component)?;

        {
            let registry = self.registry.read();
            if let Some(unknown) = constructor
                .params()
                .iter()
                .find(|param| !registry.knows(param.required.id))
            {
                return Err(DependencyError::constructor_selection(
                    type_info.name,
                    format!(
                        "没有可用的构造函数: 参数 {} 的类型 {} 不是已注册的能力",
                        unknown.name, unknown.required
                    ),
                ));
            }
        }

        ctx.push_type(type_info)?;
        let resolved = self.resolve_arguments(constructor, ctx);
        ctx.pop_type();

        let mut args = ConstructorArgs::new(resolved?);
        let instance = constructor
            .invoke(&mut args)
            .map_err(|source| DependencyError::from_construction(type_info.name, source))?;

        debug!(
            "创建实例: {} ({}, {} 个参数)",
            type_info.short_name(),
            component.scope(),
            constructor.arity()
        );
        self.diagnostics.record(WiringEvent::Constructed {
            component: type_info.short_name().to_string(),
            scope: component.scope(),
            arity: constructor.arity(),
        });
        Ok(instance)
    }

    fn resolve_arguments(&self, constructor: &Constructor, ctx: &mut ResolveContext) -> DependencyResult<Vec<ComponentRef>> {
        constructor
            .params()
            .iter()
            .map(|param| self.resolve_in(&param.key(), Some(&param.name), ctx))
            .collect()
    }
}
