//! The container: token registry, instance caches and the entry points that
//! drive the action pipelines.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use crate::actions::composite::CompositeAction;
use crate::actions::registry::{ActionRegistry, DecoratorRegistry};
use crate::actions::resolve::DefaultTokenAction;
use crate::actions::{run_chain, Action, ActionId, IocContext};
use crate::error::{DiError, DiResult};
use crate::internal::circular;
use crate::lifetime::Lifetime;
use crate::metadata::{Member, MetadataTable};
use crate::observer::Observers;
use crate::pool::CoreServices;
use crate::provider::{Provider, ProviderList, ProviderMap};
use crate::reflect::{AsyncSetupFn, Injectable, Reflects, TypeDeclaration, TypeReflect};
use crate::token::{token_key_of, Token, TokenKey};
use crate::AnyArc;

type BindFactory = Arc<dyn Fn(&Container) -> DiResult<AnyArc> + Send + Sync>;

/// How a binding produces its value.
#[derive(Clone)]
pub(crate) enum Producer {
    /// Fixed instance
    Instance(AnyArc),
    /// Closure factory
    Factory(BindFactory),
    /// Redirect to another key in the same container
    Alias(TokenKey),
    /// Reflected type constructed through the runtime scope
    Type(TypeId),
}

/// One registered token.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) lifetime: Lifetime,
    pub(crate) producer: Producer,
    pub(crate) impl_type: Option<(TypeId, &'static str)>,
}

struct ContainerInner {
    parent: Option<Container>,
    services: Arc<CoreServices>,
    bindings: RwLock<HashMap<TokenKey, Binding>>,
    singletons: Mutex<HashMap<TokenKey, AnyArc>>,
    expiring: Mutex<HashMap<TokenKey, (AnyArc, Instant)>>,
    designed: Mutex<HashSet<TypeId>>,
}

/// Token registry with parent-chained scoping.
///
/// A container maps canonical token keys to bindings and owns the singleton
/// and TTL caches for the instances it resolves. Containers are cheap
/// `Arc`-backed handles; clones share state. Registration is idempotent
/// (the first binding for a key wins) and resolution drives the pool's
/// runtime action scope.
///
/// `get` consults this container only; `resolve` runs the full
/// service-resolution chain (target-private providers, target ancestor
/// chain, local lookup, parent delegation, caller default).
///
/// # Examples
///
/// ```rust
/// use ferric_ioc::{ContainerPool, Token};
///
/// let pool = ContainerPool::new();
/// let root = pool.root();
///
/// root.bind_value(&Token::string("greeting"), "hello".to_string());
/// let greeting = root.get::<String>(&Token::string("greeting")).unwrap();
/// assert_eq!(&*greeting, "hello");
///
/// // First registration wins; re-binding the same token is a no-op.
/// root.bind_value(&Token::string("greeting"), "ignored".to_string());
/// let again = root.get::<String>(&Token::string("greeting")).unwrap();
/// assert_eq!(&*again, "hello");
/// ```
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Container {
    pub(crate) fn new(services: Arc<CoreServices>, parent: Option<Container>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                parent,
                services,
                bindings: RwLock::new(HashMap::new()),
                singletons: Mutex::new(HashMap::new()),
                expiring: Mutex::new(HashMap::new()),
                designed: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Stable identity of this container within the process.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Parent container, if any. The root has none.
    pub fn parent(&self) -> Option<Container> {
        self.inner.parent.clone()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    // ----- Pool-shared services -----

    pub(crate) fn services(&self) -> &Arc<CoreServices> {
        &self.inner.services
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.inner.services.actions
    }

    pub fn decorator_registry(&self) -> &DecoratorRegistry {
        &self.inner.services.decorators
    }

    pub fn metadata(&self) -> &MetadataTable {
        &self.inner.services.metadata
    }

    pub fn reflects(&self) -> &Reflects {
        &self.inner.services.reflects
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.services.observers
    }

    pub(crate) fn design_scope(&self) -> Arc<CompositeAction> {
        self.inner.services.design_scope.clone()
    }

    pub(crate) fn runtime_scope(&self) -> Arc<CompositeAction> {
        self.inner.services.runtime_scope.clone()
    }

    pub(crate) fn resolve_scope(&self) -> Arc<CompositeAction> {
        self.inner.services.resolve_scope.clone()
    }

    pub(crate) fn escalate_scope(&self) -> Arc<CompositeAction> {
        self.inner.services.escalate_scope.clone()
    }

    pub(crate) fn queue_async_setup(&self, instance: AnyArc, hook: AsyncSetupFn) {
        self.inner
            .services
            .async_setups
            .lock()
            .unwrap()
            .push((instance, hook, self.clone()));
    }

    // ----- Registration -----

    /// Registers the reflected type `T` under its class token.
    ///
    /// The first registration runs the design action scope: decorator
    /// metadata is folded into the type's reflect record, `provide`/`alias`/
    /// `refs` tokens are bound, the class binding is created with the
    /// lifetime the metadata implies, and setup hooks run. Registering an
    /// already-registered type is a no-op.
    pub fn register<T: Injectable>(&self) -> DiResult<()> {
        let type_id = TypeId::of::<T>();
        {
            let mut designed = self.inner.designed.lock().unwrap();
            if designed.contains(&type_id) {
                return Ok(());
            }
            designed.insert(type_id);
        }

        let mut decl = TypeDeclaration::<T>::new();
        T::declare(&mut decl);
        let reflect = TypeReflect::from_declaration(decl);
        let key = token_key_of::<T>();
        self.observers().registering(&key);

        let mut ctx = IocContext::new(self.clone());
        ctx.token = Some(key);
        ctx.type_id = Some((type_id, std::any::type_name::<T>()));
        ctx.reflect = Some(reflect);

        let scope: Arc<dyn Action> = self.design_scope();
        let actions = [scope];
        let mut tail = |_: &mut IocContext| Ok(());
        let result = run_chain(&actions, &mut ctx, &mut tail);
        if result.is_err() {
            self.inner.designed.lock().unwrap().remove(&type_id);
        }
        result
    }

    /// Binds a fixed value under `token`. Idempotent: returns `false` (and
    /// leaves the existing binding untouched) when the key is already bound.
    pub fn bind_value<T: Send + Sync + 'static>(&self, token: &Token, value: T) -> bool {
        self.insert_binding(
            token.key(),
            Binding {
                lifetime: Lifetime::Singleton,
                producer: Producer::Instance(Arc::new(value)),
                impl_type: Some((TypeId::of::<T>(), std::any::type_name::<T>())),
            },
        )
    }

    /// Binds a factory under `token` with the given lifetime. Idempotent.
    pub fn bind_factory<T, F>(&self, token: &Token, lifetime: Lifetime, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        let erased: BindFactory =
            Arc::new(move |c: &Container| factory(c).map(|v| Arc::new(v) as AnyArc));
        self.insert_binding(
            token.key(),
            Binding {
                lifetime,
                producer: Producer::Factory(erased),
                impl_type: Some((TypeId::of::<T>(), std::any::type_name::<T>())),
            },
        )
    }

    /// Replaces whatever is bound under `token` with a fixed value,
    /// discarding any cached instance. The explicit-overwrite counterpart of
    /// [`Container::bind_value`].
    pub fn replace_value<T: Send + Sync + 'static>(&self, token: &Token, value: T) {
        let key = token.key();
        self.evict(&key);
        self.inner.bindings.write().unwrap().insert(
            key,
            Binding {
                lifetime: Lifetime::Singleton,
                producer: Producer::Instance(Arc::new(value)),
                impl_type: Some((TypeId::of::<T>(), std::any::type_name::<T>())),
            },
        );
    }

    /// Replaces whatever is bound under `token` with a factory.
    pub fn replace_factory<T, F>(&self, token: &Token, lifetime: Lifetime, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        let key = token.key();
        self.evict(&key);
        let erased: BindFactory =
            Arc::new(move |c: &Container| factory(c).map(|v| Arc::new(v) as AnyArc));
        self.inner.bindings.write().unwrap().insert(
            key,
            Binding {
                lifetime,
                producer: Producer::Factory(erased),
                impl_type: Some((TypeId::of::<T>(), std::any::type_name::<T>())),
            },
        );
    }

    /// Registers a private provider map consulted only when `Target` is the
    /// requesting type in a `resolve` call.
    pub fn register_private<Target: 'static>(&self, map: ProviderMap) {
        let key = TokenKey::PrivateOf(TypeId::of::<Target>(), std::any::type_name::<Target>());
        self.insert_binding(
            key,
            Binding {
                lifetime: Lifetime::Singleton,
                producer: Producer::Instance(Arc::new(map)),
                impl_type: None,
            },
        );
    }

    /// Removes the private provider map of `Target`.
    pub fn unregister_private<Target: 'static>(&self) {
        let key = TokenKey::PrivateOf(TypeId::of::<Target>(), std::any::type_name::<Target>());
        self.inner.bindings.write().unwrap().remove(&key);
        self.evict(&key);
    }

    pub(crate) fn bind_alias(&self, key: TokenKey, target: TokenKey) -> bool {
        self.insert_binding(
            key,
            Binding {
                lifetime: Lifetime::Transient,
                producer: Producer::Alias(target),
                impl_type: None,
            },
        )
    }

    pub(crate) fn bind_type_key(
        &self,
        key: TokenKey,
        type_id: TypeId,
        type_name: &'static str,
        lifetime: Lifetime,
    ) -> bool {
        self.insert_binding(
            key,
            Binding {
                lifetime,
                producer: Producer::Type(type_id),
                impl_type: Some((type_id, type_name)),
            },
        )
    }

    fn insert_binding(&self, key: TokenKey, binding: Binding) -> bool {
        let mut bindings = self.inner.bindings.write().unwrap();
        if bindings.contains_key(&key) {
            return false;
        }
        bindings.insert(key, binding);
        true
    }

    /// Drops the binding and caches for `token`. Type bindings also drop
    /// their reflect record and decorator metadata.
    pub fn unregister(&self, token: &Token) {
        let key = token.key();
        let removed = self.inner.bindings.write().unwrap().remove(&key);
        self.evict(&key);
        if let Some(Binding {
            producer: Producer::Type(type_id),
            ..
        }) = removed
        {
            self.reflects().remove(type_id);
            self.metadata().forget(type_id);
            self.inner.designed.lock().unwrap().remove(&type_id);
        }
    }

    fn evict(&self, key: &TokenKey) {
        self.inner.singletons.lock().unwrap().remove(key);
        self.inner.expiring.lock().unwrap().remove(key);
    }

    /// Whether `token` is bound in this container (parents not consulted).
    pub fn has(&self, token: &Token) -> bool {
        self.has_key(&token.key())
    }

    /// Whether `token` qualified by `alias` is bound in this container.
    pub fn has_alias(&self, token: &Token, alias: &str) -> bool {
        self.has_key(&token.key_with(Some(alias)))
    }

    pub(crate) fn has_key(&self, key: &TokenKey) -> bool {
        self.inner.bindings.read().unwrap().contains_key(key)
    }

    // ----- Resolution -----

    /// Resolves `token` from this container only.
    ///
    /// Unregistered tokens yield `Err(DiError::NotFound)`: the sentinel
    /// outcome, distinguishable from any successfully resolved value.
    pub fn get<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        let any = self.get_key(&token.key())?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves the class token of `T` from this container.
    pub fn get_type<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get(&Token::of::<T>())
    }

    /// Resolves `token`, returning `fallback` when it is not registered.
    pub fn get_or<T: Send + Sync + 'static>(&self, token: &Token, fallback: Arc<T>) -> Arc<T> {
        self.get(token).unwrap_or(fallback)
    }

    /// Resolves `token`, panicking on failure.
    pub fn get_required<T: Send + Sync + 'static>(&self, token: &Token) -> Arc<T> {
        self.get(token)
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {:?}", token, e))
    }

    /// Runs the full service-resolution chain for `token` with no target,
    /// default or providers.
    pub fn resolve<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        self.resolve_with(ResolveRequest::new(token.clone()))
    }

    /// Runs the full service-resolution chain.
    pub fn resolve_with<T: Send + Sync + 'static>(&self, req: ResolveRequest) -> DiResult<Arc<T>> {
        let any = self.resolve_erased(req)?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves `token`, panicking on failure.
    pub fn resolve_required<T: Send + Sync + 'static>(&self, token: &Token) -> Arc<T> {
        self.resolve(token)
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {:?}", token, e))
    }

    fn resolve_erased(&self, req: ResolveRequest) -> DiResult<AnyArc> {
        let display = req.token.key().to_string();
        let mut ctx = IocContext::new(self.clone());
        ctx.token = Some(req.token.key());
        ctx.target = req.target.as_ref().and_then(|t| t.type_info());
        ctx.default_token = req.default_token.as_ref().map(|t| t.key());
        ctx.providers = req.providers;

        let default_action: Arc<dyn Action> = self
            .actions()
            .resolve(&ActionId::of::<DefaultTokenAction>())
            .unwrap_or_else(|| Arc::new(DefaultTokenAction));
        let scope: Arc<dyn Action> = self.resolve_scope();
        let chain = [scope, default_action];
        let mut tail = |_: &mut IocContext| Ok(());
        run_chain(&chain, &mut ctx, &mut tail)?;
        ctx.take_resolved().ok_or(DiError::NotFound(display))
    }

    /// Local lookup: follows alias bindings, applies the cache rules and
    /// drives the runtime scope when construction is needed.
    pub(crate) fn get_key(&self, key: &TokenKey) -> DiResult<AnyArc> {
        self.get_key_with(key, ProviderList::new())
    }

    /// Local lookup carrying call-site providers into the construction.
    pub(crate) fn get_key_with(&self, key: &TokenKey, providers: ProviderList) -> DiResult<AnyArc> {
        let _guard = circular::enter(self.id(), &key.to_string())?;

        let binding = self.inner.bindings.read().unwrap().get(key).cloned();
        let Some(binding) = binding else {
            return Err(DiError::NotFound(key.to_string()));
        };
        if let Producer::Alias(target) = &binding.producer {
            return self.get_key_with(target, providers);
        }

        let observers = self.observers();
        let timed = observers.has_observers();
        if timed {
            observers.resolving(key);
        }
        let start = timed.then(Instant::now);

        let mut ctx = IocContext::new(self.clone());
        ctx.token = Some(key.clone());
        ctx.producer = Some(binding.producer.clone());
        ctx.lifetime = Some(binding.lifetime);
        ctx.type_id = binding.impl_type;
        ctx.providers = providers;

        let scope: Arc<dyn Action> = self.runtime_scope();
        let actions = [scope];
        let mut tail = |_: &mut IocContext| Ok(());
        let result = match run_chain(&actions, &mut ctx, &mut tail) {
            Ok(()) => ctx
                .take_resolved()
                .ok_or(DiError::NotFound(key.to_string())),
            Err(e) => Err(e),
        };

        if let Some(start) = start {
            observers.resolved(key, start.elapsed());
        }
        result
    }

    /// Dependency lookup used by constructor-argument and property
    /// resolution: local binding, then on-demand registration of decorated
    /// types, then the parent chain.
    pub(crate) fn resolve_dependency(&self, key: &TokenKey) -> DiResult<AnyArc> {
        if self.has_key(key) {
            return self.get_key(key);
        }
        if let TokenKey::Type(type_id, _) = key {
            // Only types carrying injectable metadata auto-register; plain
            // unannotated classes stay unregistered.
            if let Some(hook) = self.metadata().auto_register(*type_id) {
                hook(self)?;
                if self.has_key(key) {
                    return self.get_key(key);
                }
            }
        }
        if let Some(parent) = self.parent() {
            return parent.resolve_dependency(key);
        }
        Err(DiError::NotFound(key.to_string()))
    }

    pub(crate) fn private_providers(&self, key: &TokenKey) -> Option<Arc<ProviderMap>> {
        let binding = self.inner.bindings.read().unwrap().get(key).cloned()?;
        match binding.producer {
            Producer::Instance(value) => value.downcast::<ProviderMap>().ok(),
            _ => None,
        }
    }

    // ----- Caches -----

    pub(crate) fn cached(&self, key: &TokenKey, lifetime: Lifetime) -> Option<AnyArc> {
        match lifetime {
            Lifetime::Singleton => self.inner.singletons.lock().unwrap().get(key).cloned(),
            Lifetime::Expiring(ttl) => {
                let mut cache = self.inner.expiring.lock().unwrap();
                match cache.get(key) {
                    Some((value, at)) if at.elapsed() < ttl => Some(value.clone()),
                    Some(_) => {
                        // Passive eviction on read.
                        cache.remove(key);
                        None
                    }
                    None => None,
                }
            }
            Lifetime::Transient => None,
        }
    }

    pub(crate) fn store_cached(&self, key: &TokenKey, lifetime: Lifetime, value: AnyArc) -> AnyArc {
        match lifetime {
            Lifetime::Singleton => {
                let mut cache = self.inner.singletons.lock().unwrap();
                if let Some(existing) = cache.get(key) {
                    existing.clone()
                } else {
                    cache.insert(key.clone(), value.clone());
                    value
                }
            }
            Lifetime::Expiring(_) => {
                let mut cache = self.inner.expiring.lock().unwrap();
                cache.insert(key.clone(), (value.clone(), Instant::now()));
                value
            }
            Lifetime::Transient => value,
        }
    }

    // ----- Introspection -----

    /// Provider list declared for a method of `T`: the declared specs merged
    /// with `Providers` decorator metadata.
    pub fn method_providers<T: 'static>(&self, method: &'static str) -> ProviderList {
        let type_id = TypeId::of::<T>();
        let mut list = ProviderList::new();
        if let Some(reflect) = self.reflects().get(type_id) {
            if let Some(providers) = reflect.methods.get(method) {
                for p in providers {
                    list.push(p.clone());
                }
            }
        }
        if let Some(md) = self.metadata().merged_metadata(type_id, Member::Method(method)) {
            for p in md.providers {
                list.push(p);
            }
        }
        list
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str("Bindings:\n");
        for (key, binding) in self.inner.bindings.read().unwrap().iter() {
            s.push_str(&format!("  {}: {:?}\n", key, binding.lifetime));
        }
        s.push_str(&format!(
            "Singletons cached: {}\n",
            self.inner.singletons.lock().unwrap().len()
        ));
        s.push_str(&format!(
            "TTL cached: {}\n",
            self.inner.expiring.lock().unwrap().len()
        ));
        s
    }
}

/// Parameters of one service-resolution call.
///
/// Built fluently and passed to [`Container::resolve_with`]: the token to
/// resolve, an optional requesting target (whose private providers and
/// ancestor chain are consulted first), an optional default token applied
/// after the chain is exhausted, and call-site providers.
#[derive(Clone, Debug)]
pub struct ResolveRequest {
    token: Token,
    target: Option<Token>,
    default_token: Option<Token>,
    providers: ProviderList,
}

impl ResolveRequest {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            target: None,
            default_token: None,
            providers: ProviderList::new(),
        }
    }

    /// Requesting target; must be a class token to contribute lookups.
    pub fn target(mut self, target: Token) -> Self {
        self.target = Some(target);
        self
    }

    /// Fallback token tried after the whole chain failed.
    pub fn default_token(mut self, token: Token) -> Self {
        self.default_token = Some(token);
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(mut self, providers: ProviderList) -> Self {
        self.providers = providers;
        self
    }
}
