//! 组件描述符
//!
//! [`ComponentDefinition`] 是外部元数据提取层填写的强类型适配器，
//! [`ComponentDefinition::build`] 在容器启动前校验它并生成不可变的 [`ComponentDescriptor`]。
//! [`PreRegistered`] 用于把外部已经构造好的实例直接放入注册表。

use crate::injection::{
    collection_setter, component_as, instance_as, property_setter, single_setter,
    InjectionPoint, InjectionSource, TypeMismatchError,
};
use infrastructure_common::{
    BoxError, ComponentRef, DependencyError, DependencyResult, FactoryArgs, Instance, TypeInfo,
};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// 把实例转换为某个查找类型的函数
pub type Caster = Arc<dyn Fn(&Instance) -> Option<ComponentRef> + Send + Sync>;

/// 构造器函数
pub type ConstructorFn = Arc<dyn Fn(Vec<ComponentRef>) -> Result<Instance, BoxError> + Send + Sync>;

/// 初始化钩子函数
pub type HookFn = Arc<dyn Fn(&Instance) -> Result<(), BoxError> + Send + Sync>;

/// 工厂方法函数
pub type FactoryFn =
    Arc<dyn Fn(&Instance, &FactoryArgs) -> Result<ComponentRef, BoxError> + Send + Sync>;

/// 组件别名
///
/// 组件除了按声明类型注册外，还可以按它实现的 trait object 类型注册。
#[derive(Clone)]
pub struct Alias {
    type_info: TypeInfo,
    caster: Caster,
}

impl Alias {
    /// 组件声明类型本身
    pub fn identity<C: Send + Sync + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<C>(),
            caster: Arc::new(|instance: &Instance| {
                instance.clone().downcast::<C>().ok().map(ComponentRef::new)
            }),
        }
    }

    /// 通过向上转型函数注册为其他类型
    pub fn upcast<C, T>(upcast: fn(Arc<C>) -> Arc<T>) -> Self
    where
        C: Send + Sync + 'static,
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            caster: Arc::new(move |instance: &Instance| {
                instance
                    .clone()
                    .downcast::<C>()
                    .ok()
                    .map(|concrete| ComponentRef::new(upcast(concrete)))
            }),
        }
    }

    /// 别名类型
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 把实例转换为别名类型
    pub fn cast(&self, instance: &Instance) -> Option<ComponentRef> {
        (self.caster)(instance)
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alias({})", self.type_info.name)
    }
}

/// 构造器
#[derive(Clone)]
pub struct ConstructorSpec {
    parameters: Vec<TypeInfo>,
    invoke: ConstructorFn,
}

impl ConstructorSpec {
    /// 构造器参数类型（按顺序）
    pub fn parameters(&self) -> &[TypeInfo] {
        &self.parameters
    }

    /// 是否为无参构造器
    pub fn is_default(&self) -> bool {
        self.parameters.is_empty()
    }

    /// 调用构造器
    pub fn invoke(&self, args: Vec<ComponentRef>) -> Result<Instance, BoxError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = self.parameters.iter().map(|p| p.name).collect();
        f.debug_struct("ConstructorSpec")
            .field("parameters", &params)
            .finish()
    }
}

/// 构造器参数读取器
///
/// 按构造器声明的顺序逐个取出已解析的依赖。
pub struct ConstructorArgs {
    args: std::vec::IntoIter<ComponentRef>,
}

impl ConstructorArgs {
    /// 取出下一个参数
    pub fn next<P>(&mut self) -> Result<Arc<P>, BoxError>
    where
        P: ?Sized + Send + Sync + 'static,
    {
        let component = self
            .args
            .next()
            .ok_or_else(|| TypeMismatchError::new(std::any::type_name::<P>(), "<missing>"))?;
        component_as::<P>(component)
    }
}

/// 初始化钩子
#[derive(Clone)]
pub struct HookSpec {
    name: String,
    invoke: HookFn,
}

impl HookSpec {
    /// 钩子名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 调用钩子
    pub fn invoke(&self, instance: &Instance) -> Result<(), BoxError> {
        (self.invoke)(instance)
    }
}

impl fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookSpec({})", self.name)
    }
}

/// 工厂方法
#[derive(Clone)]
pub struct FactoryMethod {
    name: String,
    produces: TypeInfo,
    invoke: FactoryFn,
}

impl FactoryMethod {
    /// 方法名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 方法产出的类型
    pub fn produces(&self) -> TypeInfo {
        self.produces
    }

    /// 在工厂实例上调用工厂方法
    pub fn invoke(&self, instance: &Instance, args: &FactoryArgs) -> Result<ComponentRef, BoxError> {
        (self.invoke)(instance, args)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .field("produces", &self.produces.name)
            .finish()
    }
}

/// 工厂产出类型查询
///
/// 产出类型必须是静态、无参数、不依赖实例状态的查询。
#[derive(Clone)]
pub enum ProducedTypeAccessor {
    /// 静态查询
    Static {
        /// 查询名称
        name: String,
        /// 查询函数
        query: fn() -> TypeInfo,
    },
    /// 依赖实例状态的查询（不被接受）
    Instance {
        /// 查询名称
        name: String,
    },
}

impl ProducedTypeAccessor {
    /// 指定类型的静态查询
    pub fn of<P: ?Sized + 'static>() -> Self {
        Self::Static {
            name: "produced_type".to_string(),
            query: TypeInfo::of::<P>,
        }
    }

    /// 查询名称
    pub fn name(&self) -> &str {
        match self {
            Self::Static { name, .. } | Self::Instance { name } => name,
        }
    }
}

impl fmt::Debug for ProducedTypeAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { name, query } => write!(f, "Static({} -> {})", name, query().name),
            Self::Instance { name } => write!(f, "Instance({})", name),
        }
    }
}

/// 工厂组件信息
#[derive(Clone, Debug)]
pub struct FactorySpec {
    method: FactoryMethod,
    produces: TypeInfo,
}

impl FactorySpec {
    /// 工厂方法
    pub fn method(&self) -> &FactoryMethod {
        &self.method
    }

    /// 产出类型
    pub fn produces(&self) -> TypeInfo {
        self.produces
    }
}

/// 组件描述符
///
/// 一个组件类型的不可变元数据。创建后不再修改，多个生命周期记录可以共享。
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: String,
    declared: Alias,
    aliases: Vec<Alias>,
    expanded: bool,
    constructor: Option<ConstructorSpec>,
    injection_points: Vec<InjectionPoint>,
    hooks: Vec<HookSpec>,
    factory: Option<FactorySpec>,
}

impl ComponentDescriptor {
    /// 组件名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 组件声明类型
    pub fn declared_type(&self) -> TypeInfo {
        self.declared.type_info()
    }

    /// 声明类型的转换器
    pub fn declared_alias(&self) -> &Alias {
        &self.declared
    }

    /// 额外注册的别名类型
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// 是否按别名类型展开注册
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// 构造器，外部实例没有构造器
    pub fn constructor(&self) -> Option<&ConstructorSpec> {
        self.constructor.as_ref()
    }

    /// 构造器参数类型
    pub fn constructor_signature(&self) -> &[TypeInfo] {
        self.constructor.as_ref().map_or(&[], |c| c.parameters())
    }

    /// 注入点（按声明顺序）
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    /// 初始化钩子（按声明顺序）
    pub fn post_construct_hooks(&self) -> &[HookSpec] {
        &self.hooks
    }

    /// 是否为工厂组件
    pub fn is_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// 工厂信息
    pub fn factory(&self) -> Option<&FactorySpec> {
        self.factory.as_ref()
    }

    /// 工厂产出类型
    pub fn produces(&self) -> Option<TypeInfo> {
        self.factory.as_ref().map(FactorySpec::produces)
    }

    /// 注册后是否会出现在该类型键下（声明类型、展开的别名或工厂产出类型）
    pub fn provides(&self, type_info: TypeInfo) -> bool {
        self.declared_type() == type_info
            || (self.expanded && self.aliases.iter().any(|a| a.type_info() == type_info))
            || self.produces() == Some(type_info)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared.type_info().name)
            .field("aliases", &self.aliases)
            .field("constructor", &self.constructor)
            .field("injection_points", &self.injection_points)
            .field("hooks", &self.hooks)
            .field("factory", &self.factory)
            .finish()
    }
}

/// 组件定义
///
/// 强类型的描述符构建器。所有约束在 [`build`](Self::build) 时检查。
///
/// ```
/// use di_abstractions::ComponentDefinition;
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync {}
///
/// #[derive(Default)]
/// struct UserRepository;
/// impl Repository for UserRepository {}
///
/// let descriptor = ComponentDefinition::<UserRepository>::new()
///     .default_constructor()
///     .implements::<dyn Repository>(|c| c as Arc<dyn Repository>)
///     .build()
///     .unwrap();
/// assert_eq!(descriptor.aliases().len(), 1);
/// ```
pub struct ComponentDefinition<C> {
    name: Option<String>,
    is_factory: bool,
    aliases: Vec<Alias>,
    constructors: Vec<ConstructorSpec>,
    injection_points: Vec<InjectionPoint>,
    hooks: Vec<HookSpec>,
    factory_methods: Vec<FactoryMethod>,
    produced_type_accessors: Vec<ProducedTypeAccessor>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> Default for ComponentDefinition<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync + 'static> ComponentDefinition<C> {
    /// 创建新的组件定义
    pub fn new() -> Self {
        Self {
            name: None,
            is_factory: false,
            aliases: Vec::new(),
            constructors: Vec::new(),
            injection_points: Vec::new(),
            hooks: Vec::new(),
            factory_methods: Vec::new(),
            produced_type_accessors: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 设置组件名称，默认为类型全名
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 标记为工厂组件
    pub fn factory(mut self) -> Self {
        self.is_factory = true;
        self
    }

    /// 按 trait object 类型注册
    pub fn implements<T>(mut self, upcast: fn(Arc<C>) -> Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.aliases.push(Alias::upcast(upcast));
        self
    }

    /// 添加构造器（通用形式）
    pub fn constructor_with<F, E>(mut self, parameters: Vec<TypeInfo>, constructor: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> Result<C, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let invoke: ConstructorFn = Arc::new(move |args: Vec<ComponentRef>| {
            let mut args = ConstructorArgs {
                args: args.into_iter(),
            };
            let component = constructor(&mut args).map_err(Into::into)?;
            Ok(Arc::new(component) as Instance)
        });
        self.constructors.push(ConstructorSpec {
            parameters,
            invoke,
        });
        self
    }

    /// 添加无参构造器
    pub fn constructor<F>(self, constructor: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.constructor_with(Vec::new(), move |_| Ok::<_, BoxError>(constructor()))
    }

    /// 添加可能失败的无参构造器
    pub fn try_constructor<F, E>(self, constructor: F) -> Self
    where
        F: Fn() -> Result<C, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.constructor_with(Vec::new(), move |_| constructor())
    }

    /// 使用 `Default` 作为无参构造器
    pub fn default_constructor(self) -> Self
    where
        C: Default,
    {
        self.constructor(C::default)
    }

    /// 添加单参数构造器
    pub fn constructor1<P1, F>(self, constructor: F) -> Self
    where
        P1: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<P1>) -> C + Send + Sync + 'static,
    {
        self.constructor_with(vec![TypeInfo::of::<P1>()], move |args| {
            Ok::<_, BoxError>(constructor(args.next::<P1>()?))
        })
    }

    /// 添加双参数构造器
    pub fn constructor2<P1, P2, F>(self, constructor: F) -> Self
    where
        P1: ?Sized + Send + Sync + 'static,
        P2: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<P1>, Arc<P2>) -> C + Send + Sync + 'static,
    {
        self.constructor_with(
            vec![TypeInfo::of::<P1>(), TypeInfo::of::<P2>()],
            move |args| {
                let p1 = args.next::<P1>()?;
                let p2 = args.next::<P2>()?;
                Ok::<_, BoxError>(constructor(p1, p2))
            },
        )
    }

    /// 添加三参数构造器
    pub fn constructor3<P1, P2, P3, F>(self, constructor: F) -> Self
    where
        P1: ?Sized + Send + Sync + 'static,
        P2: ?Sized + Send + Sync + 'static,
        P3: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<P1>, Arc<P2>, Arc<P3>) -> C + Send + Sync + 'static,
    {
        self.constructor_with(
            vec![
                TypeInfo::of::<P1>(),
                TypeInfo::of::<P2>(),
                TypeInfo::of::<P3>(),
            ],
            move |args| {
                let p1 = args.next::<P1>()?;
                let p2 = args.next::<P2>()?;
                let p3 = args.next::<P3>()?;
                Ok::<_, BoxError>(constructor(p1, p2, p3))
            },
        )
    }

    /// 注入单个组件
    pub fn inject<D, F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&C, Arc<D>) + Send + Sync + 'static,
    {
        self.injection_points.push(InjectionPoint::new(
            name,
            InjectionSource::Component {
                type_info: TypeInfo::of::<D>(),
                collection: false,
            },
            single_setter::<C, D, F>(setter),
        ));
        self
    }

    /// 注入所有匹配的组件（按注册顺序）
    pub fn inject_all<D, F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&C, Vec<Arc<D>>) + Send + Sync + 'static,
    {
        self.injection_points.push(InjectionPoint::new(
            name,
            InjectionSource::Component {
                type_info: TypeInfo::of::<D>(),
                collection: true,
            },
            collection_setter::<C, D, F>(setter),
        ));
        self
    }

    /// 注入属性值，字符串通过 `FromStr` 转换为目标类型
    pub fn inject_property<V, F>(
        mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        setter: F,
    ) -> Self
    where
        V: FromStr + Send + Sync + 'static,
        V::Err: fmt::Display,
        F: Fn(&C, V) + Send + Sync + 'static,
    {
        self.injection_points.push(InjectionPoint::new(
            name,
            InjectionSource::property::<V>(key),
            property_setter::<C, V, F>(setter),
        ));
        self
    }

    /// 添加初始化钩子
    pub fn post_construct<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&C) + Send + Sync + 'static,
    {
        self.try_post_construct(name, move |component: &C| {
            hook(component);
            Ok::<_, BoxError>(())
        })
    }

    /// 添加可能失败的初始化钩子
    pub fn try_post_construct<F, E>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&C) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let invoke: HookFn = Arc::new(move |instance: &Instance| {
            let component = instance_as::<C>(instance)?;
            hook(component).map_err(Into::into)
        });
        self.hooks.push(HookSpec {
            name: name.into(),
            invoke,
        });
        self
    }

    /// 添加工厂方法
    pub fn factory_method<P, F>(self, name: impl Into<String>, method: F) -> Self
    where
        P: ?Sized + Send + Sync + 'static,
        F: Fn(&C) -> Arc<P> + Send + Sync + 'static,
    {
        self.factory_method_with_args(name, move |component: &C, _: &FactoryArgs| {
            Ok::<_, BoxError>(method(component))
        })
    }

    /// 添加可能失败的工厂方法
    pub fn try_factory_method<P, F, E>(self, name: impl Into<String>, method: F) -> Self
    where
        P: ?Sized + Send + Sync + 'static,
        F: Fn(&C) -> Result<Arc<P>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.factory_method_with_args(name, move |component: &C, _: &FactoryArgs| {
            method(component)
        })
    }

    /// 添加接收调用参数的工厂方法
    pub fn factory_method_with_args<P, F, E>(mut self, name: impl Into<String>, method: F) -> Self
    where
        P: ?Sized + Send + Sync + 'static,
        F: Fn(&C, &FactoryArgs) -> Result<Arc<P>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let invoke: FactoryFn = Arc::new(move |instance: &Instance, args: &FactoryArgs| {
            let factory = instance_as::<C>(instance)?;
            let produced = method(factory, args).map_err(Into::into)?;
            Ok(ComponentRef::new(produced))
        });
        self.factory_methods.push(FactoryMethod {
            name: name.into(),
            produces: TypeInfo::of::<P>(),
            invoke,
        });
        self
    }

    /// 声明工厂产出类型（静态查询）
    pub fn produces<P: ?Sized + 'static>(self) -> Self {
        self.produced_type_accessor(ProducedTypeAccessor::of::<P>())
    }

    /// 声明工厂产出类型查询
    pub fn produced_type_accessor(mut self, accessor: ProducedTypeAccessor) -> Self {
        self.produced_type_accessors.push(accessor);
        self
    }

    /// 校验并生成组件描述符
    pub fn build(self) -> DependencyResult<ComponentDescriptor> {
        let declared = Alias::identity::<C>();
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(DependencyError::invalid_descriptor(
                    declared.type_info().name,
                    "组件名称不能为空",
                ));
            }
            Some(name) => name,
            None => declared.type_info().name.to_string(),
        };
        let invalid = |message: String| DependencyError::invalid_descriptor(name.clone(), message);

        let constructor = match self.constructors.len() {
            1 => self.constructors.into_iter().next(),
            0 => return Err(invalid("缺少构造器".to_string())),
            n => return Err(invalid(format!("只允许一个构造器, 实际 {} 个", n))),
        };

        let mut point_names = HashSet::new();
        for point in &self.injection_points {
            if !point_names.insert(point.name()) {
                return Err(invalid(format!("注入点名称重复: {}", point.name())));
            }
            if let InjectionSource::Property { key, .. } = point.source() {
                if key.trim().is_empty() {
                    return Err(invalid(format!("属性注入点 {} 缺少属性键", point.name())));
                }
            }
        }

        let mut hook_names = HashSet::new();
        for hook in &self.hooks {
            if !hook_names.insert(hook.name()) {
                return Err(invalid(format!("初始化钩子名称重复: {}", hook.name())));
            }
        }

        let factory = if self.is_factory {
            Some(validate_factory(
                &name,
                self.factory_methods,
                self.produced_type_accessors,
            )?)
        } else {
            if !self.factory_methods.is_empty() || !self.produced_type_accessors.is_empty() {
                return Err(invalid("非工厂组件不能声明工厂方法或产出类型".to_string()));
            }
            None
        };

        let mut aliases: Vec<Alias> = Vec::with_capacity(self.aliases.len());
        for alias in self.aliases {
            if alias.type_info() != declared.type_info()
                && !aliases.iter().any(|a| a.type_info() == alias.type_info())
            {
                aliases.push(alias);
            } else {
                warn!("组件 {} 的重复别名已忽略: {}", name, alias.type_info().name);
            }
        }

        debug!("组件描述符已生成: {} (别名 {} 个)", name, aliases.len());
        Ok(ComponentDescriptor {
            name,
            declared,
            aliases,
            expanded: true,
            constructor,
            injection_points: self.injection_points,
            hooks: self.hooks,
            factory,
        })
    }
}

fn validate_factory(
    name: &str,
    methods: Vec<FactoryMethod>,
    accessors: Vec<ProducedTypeAccessor>,
) -> DependencyResult<FactorySpec> {
    let invalid = |message: String| DependencyError::invalid_descriptor(name, message);

    if methods.len() != 1 {
        return Err(invalid(format!(
            "工厂组件必须声明一个工厂方法, 实际 {} 个",
            methods.len()
        )));
    }
    if accessors.len() != 1 {
        return Err(invalid(format!(
            "工厂组件必须声明一个产出类型查询, 实际 {} 个",
            accessors.len()
        )));
    }

    let produces = match &accessors[0] {
        ProducedTypeAccessor::Static { query, .. } => query(),
        ProducedTypeAccessor::Instance { name: accessor } => {
            return Err(invalid(format!("产出类型查询 {} 必须是静态方法", accessor)));
        }
    };

    let method = methods.into_iter().next().ok_or_else(|| invalid("缺少工厂方法".to_string()))?;
    if method.produces() != produces {
        return Err(invalid(format!(
            "工厂方法 {} 产出 {}, 与声明的产出类型 {} 不一致",
            method.name(),
            method.produces().name,
            produces.name
        )));
    }

    Ok(FactorySpec { method, produces })
}

/// 外部预先构造的实例
///
/// 绕过生命周期状态机直接注册，视为已经就绪。
///
/// ```
/// use di_abstractions::PreRegistered;
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let registration = PreRegistered::new(Arc::new(Clock)).named("clock");
/// assert_eq!(registration.descriptor().name(), "clock");
/// ```
pub struct PreRegistered {
    descriptor: ComponentDescriptor,
    instance: Instance,
    mismatch: Option<String>,
}

impl PreRegistered {
    /// 包装外部实例，只按自身类型和名称注册
    pub fn new<C: Send + Sync + 'static>(instance: Arc<C>) -> Self {
        let declared = Alias::identity::<C>();
        Self {
            descriptor: ComponentDescriptor {
                name: declared.type_info().name.to_string(),
                declared,
                aliases: Vec::new(),
                expanded: false,
                constructor: None,
                injection_points: Vec::new(),
                hooks: Vec::new(),
                factory: None,
            },
            instance,
            mismatch: None,
        }
    }

    fn check_instance_type<C: 'static>(&mut self, operation: &str) {
        let requested = TypeInfo::of::<C>();
        let actual = self.descriptor.declared_type();
        if requested != actual && self.mismatch.is_none() {
            self.mismatch = Some(format!(
                "{} 指定的实例类型 {} 与外部实例类型 {} 不一致",
                operation, requested.name, actual.name
            ));
        }
    }

    /// 设置注册名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// 同时按 trait object 类型注册（展开注册）
    pub fn expand<C, T>(mut self, upcast: fn(Arc<C>) -> Arc<T>) -> Self
    where
        C: Send + Sync + 'static,
        T: ?Sized + Send + Sync + 'static,
    {
        self.check_instance_type::<C>("expand");
        let alias = Alias::upcast(upcast);
        if !self
            .descriptor
            .aliases
            .iter()
            .any(|a| a.type_info() == alias.type_info())
        {
            self.descriptor.aliases.push(alias);
        }
        self.descriptor.expanded = true;
        self
    }

    /// 把外部实例作为工厂注册
    pub fn with_factory_method<C, P, F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        C: Send + Sync + 'static,
        P: ?Sized + Send + Sync + 'static,
        F: Fn(&C, &FactoryArgs) -> Result<Arc<P>, BoxError> + Send + Sync + 'static,
    {
        self.check_instance_type::<C>("with_factory_method");
        let invoke: FactoryFn = Arc::new(move |instance: &Instance, args: &FactoryArgs| {
            let factory = instance_as::<C>(instance)?;
            Ok(ComponentRef::new(method(factory, args)?))
        });
        let produces = TypeInfo::of::<P>();
        self.descriptor.factory = Some(FactorySpec {
            method: FactoryMethod {
                name: name.into(),
                produces,
                invoke,
            },
            produces,
        });
        self
    }

    /// 描述符
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// 拆分为描述符和实例
    ///
    /// `expand` 或 `with_factory_method` 指定的类型与实例类型不一致时返回 `InvalidDescriptor`。
    pub fn into_parts(self) -> DependencyResult<(ComponentDescriptor, Instance)> {
        if let Some(message) = self.mismatch {
            return Err(DependencyError::invalid_descriptor(self.descriptor.name, message));
        }
        Ok((self.descriptor, self.instance))
    }
}

impl fmt::Debug for PreRegistered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreRegistered")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
