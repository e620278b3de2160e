//! 组件描述定义
//!
//! 组件类型在发现阶段一次性描述清楚：声明的能力、限定名、作用域、执行上下文要求、
//! 构造函数、可注入字段和初始化钩子。解析阶段只读取这些描述，不需要运行时反射。
//!
//! ```rust
//! use infrastructure_common::{ComponentType, Inject};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello".to_string()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Reception {
//!     greeter: Inject<dyn Greeter>,
//! }
//!
//! let english = ComponentType::builder::<EnglishGreeter>()
//!     .qualifier("en")
//!     .provides::<dyn Greeter>(|g| g)
//!     .no_arg_constructor(EnglishGreeter::default)
//!     .build();
//!
//! let reception = ComponentType::builder::<Reception>()
//!     .no_arg_constructor(Reception::default)
//!     .field::<dyn Greeter>("en", |r| &r.greeter)
//!     .build();
//!
//! assert_eq!(english.effective_qualifier(), "en");
//! assert_eq!(reception.injection_points().len(), 1);
//! ```

use crate::errors::BoxError;
use crate::inject::Inject;
use crate::lifecycle::{ContextRequirement, Scope};
use crate::metadata::{CapabilityKey, TypeInfo};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除后的组件实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 能力转换函数：把具体实例转换成装箱的 `Arc<dyn Capability>`
type CastFn = Arc<dyn Fn(&Instance) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// 构造函数
type BuildFn = Arc<dyn Fn(&mut ConstructorArgs) -> Result<Instance, BoxError> + Send + Sync>;

/// 字段赋值函数，返回值表示是否真正写入
type AssignFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &ComponentRef) -> Result<bool, String> + Send + Sync>;

/// 初始化钩子
type HookFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;

/// 服务标记
///
/// 发现协作者按标记查找候选类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    /// 通用组件
    Component,
    /// 业务服务
    Service,
    /// 数据访问组件
    Repository,
    /// 配置类
    Configuration,
    /// 应用根声明需要持久化支持
    Persistence,
    /// UI 根
    UiRoot,
    /// UI 组件
    UiComponent,
}

impl Marker {
    /// 启动扫描阶段识别的服务标记
    pub const SERVICE_MARKERS: [Self; 6] = [
        Self::Component,
        Self::Service,
        Self::Repository,
        Self::Configuration,
        Self::UiRoot,
        Self::UiComponent,
    ];
}

/// 能力绑定
#[derive(Clone)]
pub struct CapabilityBinding {
    /// 能力类型
    pub capability: TypeInfo,
    cast: CastFn,
}

impl CapabilityBinding {
    /// 把实例转换为该能力，结果是装箱的 `Arc<C>`
    pub fn cast(&self, instance: &Instance) -> Option<Box<dyn Any + Send + Sync>> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for CapabilityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityBinding")
            .field("capability", &self.capability.name)
            .finish_non_exhaustive()
    }
}

/// 构造函数参数
#[derive(Debug, Clone)]
pub struct Parameter {
    /// 参数名，作为限定名的后备消歧依据
    pub name: String,
    /// 所需类型
    pub required: TypeInfo,
    /// 显式限定名
    pub qualifier: Option<String>,
}

impl Parameter {
    /// 创建参数描述
    pub fn of<C: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: TypeInfo::of::<C>(),
            qualifier: None,
        }
    }

    /// 设置限定名
    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 查找键
    pub fn key(&self) -> CapabilityKey {
        CapabilityKey::new(self.required, self.qualifier.clone())
    }
}

/// 构造函数描述
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Parameter>,
    marked: bool,
    build: BuildFn,
}

impl Constructor {
    /// 参数列表
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// 参数个数
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// 是否被标记为注入构造函数
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// 调用构造函数
    pub fn invoke(&self, args: &mut ConstructorArgs) -> Result<Instance, BoxError> {
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .field("marked", &self.marked)
            .finish_non_exhaustive()
    }
}

/// 已解析的构造参数
#[derive(Debug, Default)]
pub struct ConstructorArgs {
    values: Vec<Option<ComponentRef>>,
}

impl ConstructorArgs {
    /// 按参数顺序创建
    pub fn new(values: Vec<ComponentRef>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 取出第 `index` 个参数并转换为所需类型
    pub fn take<C: ?Sized + Send + Sync + 'static>(&mut self, index: usize) -> Result<Arc<C>, BoxError> {
        let value = self
            .values
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| format!("构造参数 #{index} 不存在或已被取走"))?;

        value.cast::<C>().ok_or_else(|| {
            format!(
                "构造参数 #{index} 类型不匹配: {} 未提供 {}",
                value.component().type_info(),
                std::any::type_name::<C>()
            )
            .into()
        })
    }
}

/// 注入点（字段）
#[derive(Clone)]
pub struct InjectionPoint {
    /// 字段名，作为限定名的后备消歧依据
    pub name: String,
    /// 所需类型
    pub required: TypeInfo,
    /// 显式限定名
    pub qualifier: Option<String>,
    /// 声明该字段的类型
    pub declaring: TypeInfo,
    assign: AssignFn,
}

impl InjectionPoint {
    /// 查找键
    pub fn key(&self) -> CapabilityKey {
        CapabilityKey::new(self.required, self.qualifier.clone())
    }

    /// 把解析结果写入目标实例
    pub fn assign(&self, target: &(dyn Any + Send + Sync), value: &ComponentRef) -> Result<bool, String> {
        (self.assign)(target, value)
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("name", &self.name)
            .field("required", &self.required.name)
            .field("qualifier", &self.qualifier)
            .field("declaring", &self.declaring.name)
            .finish_non_exhaustive()
    }
}

/// 初始化钩子
#[derive(Clone)]
pub struct Hook {
    /// 钩子名称
    pub name: String,
    invoke: HookFn,
}

impl Hook {
    /// 调用钩子
    pub fn invoke(&self, target: &(dyn Any + Send + Sync)) -> Result<(), BoxError> {
        (self.invoke)(target)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish_non_exhaustive()
    }
}

/// 组件类型描述
///
/// 发现完成后只读。
pub struct ComponentType {
    type_info: TypeInfo,
    name: String,
    qualifier: Option<String>,
    scope: Scope,
    context: ContextRequirement,
    markers: Vec<Marker>,
    bindings: Vec<CapabilityBinding>,
    constructors: Vec<Constructor>,
    fields: Vec<InjectionPoint>,
    hooks: Vec<Hook>,
    parent: Option<TypeInfo>,
}

impl ComponentType {
    /// 创建组件类型构建器
    pub fn builder<T: Send + Sync + 'static>() -> ComponentTypeBuilder<T> {
        ComponentTypeBuilder::new()
    }

    /// 具体类型信息
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 显式声明的限定名
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// 注册时使用的限定名：显式限定名，否则为类型短名
    pub fn effective_qualifier(&self) -> &str {
        self.qualifier
            .as_deref()
            .unwrap_or_else(|| self.type_info.short_name())
    }

    /// 作用域
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// 执行上下文要求
    pub fn context(&self) -> ContextRequirement {
        self.context
    }

    /// 是否只能在 UI 线程上解析
    pub fn is_ui_bound(&self) -> bool {
        self.context == ContextRequirement::UiThread
    }

    /// 服务标记
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// 是否带有指定标记
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    /// 声明的能力（不含自身具体类型）
    pub fn capabilities(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.bindings
            .iter()
            .map(|binding| binding.capability)
            .filter(move |capability| capability.id != self.type_info.id)
    }

    /// 是否提供指定能力（含自身具体类型）
    pub fn provides(&self, capability: TypeId) -> bool {
        self.binding(capability).is_some()
    }

    /// 查找能力绑定
    pub fn binding(&self, capability: TypeId) -> Option<&CapabilityBinding> {
        self.bindings.iter().find(|binding| binding.capability.id == capability)
    }

    /// 构造函数列表
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// 整个类型层次上的注入点，父类型的在前
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.fields
    }

    /// 直接声明在本类型上的初始化钩子，按声明顺序
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// 父类型
    pub fn parent(&self) -> Option<TypeInfo> {
        self.parent
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("type", &self.type_info.name)
            .field("name", &self.name)
            .field("qualifier", &self.qualifier)
            .field("scope", &self.scope)
            .field("context", &self.context)
            .field("markers", &self.markers)
            .field(
                "capabilities",
                &self.capabilities().map(|c| c.name).collect::<Vec<_>>(),
            )
            .field("constructors", &self.constructors.len())
            .field("fields", &self.fields)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// 组件类型构建器
pub struct ComponentTypeBuilder<T> {
    component: ComponentType,
    parent_fields: Vec<InjectionPoint>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ComponentTypeBuilder<T> {
    fn new() -> Self {
        let type_info = TypeInfo::of::<T>();
        let self_binding = CapabilityBinding {
            capability: type_info,
            cast: Arc::new(|instance: &Instance| {
                let typed = Arc::clone(instance).downcast::<T>().ok()?;
                Some(Box::new(typed) as Box<dyn Any + Send + Sync>)
            }),
        };

        Self {
            component: ComponentType {
                type_info,
                name: type_info.short_name().to_string(),
                qualifier: None,
                scope: Scope::Singleton,
                context: ContextRequirement::Any,
                markers: Vec::new(),
                bindings: vec![self_binding],
                constructors: Vec::new(),
                fields: Vec::new(),
                hooks: Vec::new(),
                parent: None,
            },
            parent_fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 设置组件名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.component.name = name.into();
        self
    }

    /// 设置限定名
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.component.qualifier = Some(qualifier.into());
        self
    }

    /// 设置作用域
    pub fn scope(mut self, scope: Scope) -> Self {
        self.component.scope = scope;
        self
    }

    /// 每次请求创建新实例
    pub fn per_request(self) -> Self {
        self.scope(Scope::PerRequest)
    }

    /// 只能在 UI 线程上构造和解析
    pub fn ui_bound(mut self) -> Self {
        self.component.context = ContextRequirement::UiThread;
        self
    }

    /// 添加服务标记
    pub fn marker(mut self, marker: Marker) -> Self {
        if !self.component.markers.contains(&marker) {
            self.component.markers.push(marker);
        }
        self
    }

    /// 声明实现的能力
    ///
    /// `convert` 通常就是 `|c| c`，由编译器完成到 `Arc<dyn Trait>` 的转换。
    pub fn provides<C>(mut self, convert: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let capability = TypeInfo::of::<C>();
        if self.component.binding(capability.id).is_some() {
            return self;
        }

        self.component.bindings.push(CapabilityBinding {
            capability,
            cast: Arc::new(move |instance: &Instance| {
                let typed = Arc::clone(instance).downcast::<T>().ok()?;
                Some(Box::new(convert(typed)) as Box<dyn Any + Send + Sync>)
            }),
        });
        self
    }

    /// 添加无参构造函数
    pub fn no_arg_constructor<F>(mut self, build: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.component.constructors.push(Constructor {
            params: Vec::new(),
            marked: false,
            build: Arc::new(move |_args: &mut ConstructorArgs| -> Result<Instance, BoxError> {
                Ok(Arc::new(build()))
            }),
        });
        self
    }

    /// 添加带参数的构造函数
    pub fn constructor<F>(self, params: Vec<Parameter>, build: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(params, false, build)
    }

    /// 添加被标记的注入构造函数，存在多个构造函数时用于选择
    pub fn injection_constructor<F>(self, params: Vec<Parameter>, build: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(params, true, build)
    }

    fn push_constructor<F>(mut self, params: Vec<Parameter>, marked: bool, build: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.component.constructors.push(Constructor {
            params,
            marked,
            build: Arc::new(move |args: &mut ConstructorArgs| -> Result<Instance, BoxError> {
                Ok(Arc::new(build(args)?))
            }),
        });
        self
    }

    /// 声明可注入字段
    pub fn field<C>(self, name: impl Into<String>, accessor: fn(&T) -> &Inject<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.push_field(name.into(), None, accessor)
    }

    /// 声明带显式限定名的可注入字段
    pub fn qualified_field<C>(
        self,
        name: impl Into<String>,
        qualifier: impl Into<String>,
        accessor: fn(&T) -> &Inject<C>,
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.push_field(name.into(), Some(qualifier.into()), accessor)
    }

    fn push_field<C>(mut self, name: String, qualifier: Option<String>, accessor: fn(&T) -> &Inject<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let assign: AssignFn = Arc::new(move |target: &(dyn Any + Send + Sync), value: &ComponentRef| -> Result<bool, String> {
            let target = target
                .downcast_ref::<T>()
                .ok_or_else(|| format!("目标实例不是 {}", std::any::type_name::<T>()))?;
            let value = value.cast::<C>().ok_or_else(|| {
                format!(
                    "{} 未提供 {}",
                    value.component().type_info(),
                    std::any::type_name::<C>()
                )
            })?;
            Ok(accessor(target).set(value))
        });

        self.component.fields.push(InjectionPoint {
            name,
            required: TypeInfo::of::<C>(),
            qualifier,
            declaring: self.component.type_info,
            assign,
        });
        self
    }

    /// 继承父类型的注入点
    ///
    /// `project` 从本类型取出内嵌的父类型部分，父类型的字段排在本类型字段之前。
    /// 父类型的初始化钩子不会被继承。
    pub fn extends<P: Send + Sync + 'static>(mut self, parent: &ComponentType, project: fn(&T) -> &P) -> Self {
        self.component.parent = Some(parent.type_info());
        self.parent_fields = parent
            .injection_points()
            .iter()
            .map(|point| {
                let inherited = point.clone();
                InjectionPoint {
                    assign: Arc::new(move |target: &(dyn Any + Send + Sync), value: &ComponentRef| -> Result<bool, String> {
                        let target = target
                            .downcast_ref::<T>()
                            .ok_or_else(|| format!("目标实例不是 {}", std::any::type_name::<T>()))?;
                        inherited.assign(project(target), value)
                    }),
                    ..point.clone()
                }
            })
            .collect();
        self
    }

    /// 添加初始化钩子，按添加顺序调用
    pub fn post_construct<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.component.hooks.push(Hook {
            name: name.into(),
            invoke: Arc::new(move |target: &(dyn Any + Send + Sync)| -> Result<(), BoxError> {
                let target = target
                    .downcast_ref::<T>()
                    .ok_or_else(|| format!("目标实例不是 {}", std::any::type_name::<T>()))?;
                hook(target)
            }),
        });
        self
    }

    /// 完成构建
    pub fn build(mut self) -> Arc<ComponentType> {
        if !self.parent_fields.is_empty() {
            let own = std::mem::take(&mut self.component.fields);
            self.component.fields = self.parent_fields;
            self.component.fields.extend(own);
        }
        Arc::new(self.component)
    }
}

/// 组件实例引用：实例加上其组件类型描述
#[derive(Clone)]
pub struct ComponentRef {
    instance: Instance,
    component: Arc<ComponentType>,
}

impl ComponentRef {
    /// 创建实例引用
    pub fn new(instance: Instance, component: Arc<ComponentType>) -> Self {
        Self { instance, component }
    }

    /// 类型擦除的实例
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// 组件类型
    pub fn component(&self) -> &Arc<ComponentType> {
        &self.component
    }

    /// 实例标识（地址），用于每次请求实例的状态跟踪
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.instance).cast::<()>() as usize
    }

    /// 是否指向同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    /// 转换为具体类型
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    /// 转换为组件声明的任意能力（含自身具体类型）
    pub fn cast<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        let boxed = self.component.binding(TypeId::of::<C>())?.cast(&self.instance)?;
        boxed.downcast::<Arc<C>>().ok().map(|typed| *typed)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("type", &self.component.type_info().name)
            .field("identity", &format!("{:#x}", self.identity()))
            .finish()
    }
}

/// 原始启动参数，原样传给应用根的构造函数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupArgs(Vec<String>);

impl StartupArgs {
    /// 创建启动参数
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    /// 参数切片
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// 是否包含指定标志
    pub fn has_flag(&self, flag: &str) -> bool {
        self.0.iter().any(|arg| arg == flag)
    }

    /// 取出所有带指定前缀的参数值
    pub fn values_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter_map(move |arg| arg.strip_prefix(prefix))
            .filter(|value| !value.is_empty())
    }

    /// 启动参数的组件描述，实例由启动器预先注册
    pub fn component_type() -> Arc<ComponentType> {
        ComponentType::builder::<Self>()
            .name("startupArgs")
            .marker(Marker::Configuration)
            .build()
    }
}
