//! Per-type reflect records.
//!
//! Rust has no runtime reflection, so every injectable type declares its own
//! design facts (constructor parameter tokens, property injection points,
//! method provider lists, ancestor chain) through [`Injectable::declare`].
//! The first registration of the type folds those declarations together with
//! its decorator metadata into a [`TypeReflect`] record owned by the pool's
//! [`Reflects`] registry; the record lives until the type is explicitly
//! unregistered.

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::modules::{AsyncModuleSetup, ModuleSetup};
use crate::provider::Provider;
use crate::token::Token;
use crate::AnyArc;

pub(crate) type CtorFn =
    Arc<dyn Fn(CtorArgs) -> DiResult<Box<dyn Any + Send + Sync>> + Send + Sync>;
pub(crate) type PropSetter =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), AnyArc) -> DiResult<()> + Send + Sync>;
pub(crate) type SetupFn = Arc<dyn Fn(&AnyArc, &Container) -> DiResult<()> + Send + Sync>;
pub(crate) type BoxSetupFuture = Pin<Box<dyn Future<Output = DiResult<()>> + Send>>;
pub(crate) type AsyncSetupFn = Arc<dyn Fn(AnyArc, Container) -> BoxSetupFuture + Send + Sync>;

/// A type the container can construct.
///
/// `declare` states the design facts the container cannot observe on its
/// own; `construct` consumes the resolved constructor arguments in the
/// declared order.
///
/// # Examples
///
/// ```rust
/// use ferric_ioc::{CtorArgs, DiResult, Injectable, TypeDeclaration};
/// use std::sync::Arc;
///
/// struct Engine;
/// impl Injectable for Engine {
///     fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
///         Ok(Engine)
///     }
/// }
///
/// struct Car {
///     engine: Arc<Engine>,
/// }
/// impl Injectable for Car {
///     fn declare(decl: &mut TypeDeclaration<Self>) {
///         decl.param::<Engine>("engine");
///     }
///     fn construct(args: &mut CtorArgs) -> DiResult<Self> {
///         Ok(Car {
///             engine: args.take::<Engine>()?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Declares constructor parameters, property injection points, ancestor
    /// chain and lifecycle hooks. The default declares nothing.
    fn declare(_decl: &mut TypeDeclaration<Self>) {}

    /// Builds an instance from resolved constructor arguments.
    fn construct(args: &mut CtorArgs) -> DiResult<Self>;
}

/// Declared constructor parameter.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub token: Token,
}

/// Declared property injection point with its type-erased setter.
#[derive(Clone)]
pub struct PropSpec {
    pub name: &'static str,
    pub token: Token,
    pub(crate) setter: PropSetter,
}

impl std::fmt::Debug for PropSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropSpec")
            .field("name", &self.name)
            .field("token", &self.token)
            .finish()
    }
}

/// Design declaration collector passed to [`Injectable::declare`].
pub struct TypeDeclaration<T> {
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) props: Vec<PropSpec>,
    pub(crate) methods: Vec<(&'static str, Vec<Provider>)>,
    pub(crate) extends: Vec<(TypeId, &'static str)>,
    pub(crate) setup: Option<SetupFn>,
    pub(crate) async_setup: Option<AsyncSetupFn>,
    _marker: PhantomData<fn(T)>,
}

impl<T: Injectable> TypeDeclaration<T> {
    pub(crate) fn new() -> Self {
        Self {
            params: Vec::new(),
            props: Vec::new(),
            methods: Vec::new(),
            extends: Vec::new(),
            setup: None,
            async_setup: None,
            _marker: PhantomData,
        }
    }

    /// Declares a constructor parameter whose design type is `D`.
    pub fn param<D: Send + Sync + 'static>(&mut self, name: &'static str) -> &mut Self {
        self.params.push(ParamSpec {
            name,
            token: Token::of::<D>(),
        });
        self
    }

    /// Declares a constructor parameter resolved through an explicit token.
    pub fn param_token(&mut self, name: &'static str, token: Token) -> &mut Self {
        self.params.push(ParamSpec { name, token });
        self
    }

    /// Declares a property injection point of design type `D`.
    pub fn property<D: Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        set: fn(&mut T, Arc<D>),
    ) -> &mut Self {
        self.property_token(name, Token::of::<D>(), set)
    }

    /// Declares a property injection point resolved through an explicit token.
    pub fn property_token<D: Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        token: Token,
        set: fn(&mut T, Arc<D>),
    ) -> &mut Self {
        let setter: PropSetter = Arc::new(
            move |obj: &mut (dyn Any + Send + Sync), value: AnyArc| -> DiResult<()> {
                let target = obj
                    .downcast_mut::<T>()
                    .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
                let value = value
                    .downcast::<D>()
                    .map_err(|_| DiError::TypeMismatch(std::any::type_name::<D>()))?;
                set(target, value);
                Ok(())
            },
        );
        self.props.push(PropSpec {
            name,
            token,
            setter,
        });
        self
    }

    /// Declares an ancestor in the type's reference chain (most-derived
    /// first). Service resolution retries target-bound lookups against each
    /// declared ancestor.
    pub fn extends<B: 'static>(&mut self) -> &mut Self {
        self.extends
            .push((TypeId::of::<B>(), std::any::type_name::<B>()));
        self
    }

    /// Declares an explicit provider list for a method.
    pub fn method(&mut self, name: &'static str, providers: Vec<Provider>) -> &mut Self {
        self.methods.push((name, providers));
        self
    }

    /// Runs the type's [`ModuleSetup`] hook once, synchronously, at
    /// registration time.
    pub fn autorun(&mut self) -> &mut Self
    where
        T: ModuleSetup,
    {
        self.setup = Some(Arc::new(
            |instance: &AnyArc, container: &Container| -> DiResult<()> {
                let this = (**instance)
                    .downcast_ref::<T>()
                    .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
                this.setup(container)
            },
        ));
        self
    }

    /// Queues the type's [`AsyncModuleSetup`] hook at registration time; the
    /// pool awaits queued hooks in order when
    /// [`ContainerPool::setup_async`](crate::ContainerPool::setup_async) runs.
    pub fn autorun_async(&mut self) -> &mut Self
    where
        T: AsyncModuleSetup,
    {
        self.async_setup = Some(Arc::new(
            |instance: AnyArc, container: Container| -> BoxSetupFuture {
                Box::pin(async move {
                    let this = instance
                        .downcast::<T>()
                        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))?;
                    this.setup(&container).await
                })
            },
        ));
        self
    }
}

/// Resolved constructor arguments, consumed in declaration order.
pub struct CtorArgs {
    values: VecDeque<AnyArc>,
}

impl CtorArgs {
    pub(crate) fn new(values: Vec<AnyArc>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Takes the next argument as `Arc<D>`.
    pub fn take<D: Send + Sync + 'static>(&mut self) -> DiResult<Arc<D>> {
        let value = self
            .values
            .pop_front()
            .ok_or(DiError::NotFound(std::any::type_name::<D>().to_string()))?;
        value
            .downcast::<D>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<D>()))
    }

    /// Takes the next argument without downcasting.
    pub fn take_any(&mut self) -> Option<AnyArc> {
        self.values.pop_front()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-type cache of derived design facts.
///
/// Built lazily on the type's first registration; read by the runtime and
/// service-resolution chains; dropped only on explicit unregistration.
pub struct TypeReflect {
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Decorator names recorded against this type, in dispatch order
    pub decorators: Vec<&'static str>,
    pub params: Vec<ParamSpec>,
    pub props: Vec<PropSpec>,
    pub methods: HashMap<&'static str, Vec<Provider>>,
    /// Declared ancestor chain, most-derived first
    pub extends: Vec<(TypeId, &'static str)>,
    pub singleton: bool,
    pub expires: Option<Duration>,
    pub(crate) ctor: CtorFn,
    pub(crate) setup: Option<SetupFn>,
    pub(crate) async_setup: Option<AsyncSetupFn>,
    pub(crate) setup_done: AtomicBool,
}

impl TypeReflect {
    pub(crate) fn from_declaration<T: Injectable>(decl: TypeDeclaration<T>) -> Self {
        let ctor: CtorFn = Arc::new(|mut args: CtorArgs| -> DiResult<Box<dyn Any + Send + Sync>> {
            Ok(Box::new(T::construct(&mut args)?))
        });
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            decorators: Vec::new(),
            params: decl.params,
            props: decl.props,
            methods: decl.methods.into_iter().collect(),
            extends: decl.extends,
            singleton: false,
            expires: None,
            ctor,
            setup: decl.setup,
            async_setup: decl.async_setup,
            setup_done: AtomicBool::new(false),
        }
    }

    /// Effective lifetime implied by the reflect flags.
    pub fn lifetime(&self) -> crate::Lifetime {
        if self.singleton {
            crate::Lifetime::Singleton
        } else if let Some(ttl) = self.expires {
            crate::Lifetime::Expiring(ttl)
        } else {
            crate::Lifetime::Transient
        }
    }
}

impl std::fmt::Debug for TypeReflect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeReflect")
            .field("type_name", &self.type_name)
            .field("decorators", &self.decorators)
            .field("singleton", &self.singleton)
            .field("expires", &self.expires)
            .finish()
    }
}

/// Pool-level registry of [`TypeReflect`] records.
#[derive(Default)]
pub struct Reflects {
    map: RwLock<HashMap<TypeId, Arc<TypeReflect>>>,
}

impl Reflects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_id: TypeId) -> Option<Arc<TypeReflect>> {
        self.map.read().unwrap().get(&type_id).cloned()
    }

    pub fn has(&self, type_id: TypeId) -> bool {
        self.map.read().unwrap().contains_key(&type_id)
    }

    pub(crate) fn insert(&self, reflect: TypeReflect) -> Arc<TypeReflect> {
        let arc = Arc::new(reflect);
        self.map.write().unwrap().insert(arc.type_id, arc.clone());
        arc
    }

    pub(crate) fn remove(&self, type_id: TypeId) {
        self.map.write().unwrap().remove(&type_id);
    }
}
