//! Container pool: parent/child scoping and pool-shared core services.

use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use crate::actions::composite::CompositeAction;
use crate::actions::design::{
    AutorunAction, BindProviderAction, CommitReflectAction, DecoratorDispatchAction,
    MarkSingletonAction, RecordReflectAction, RegisterBindingAction, RouteRegisterAction,
};
use crate::actions::registry::{ActionRegistry, DecoratorRegistry, LifePhase};
use crate::actions::resolve::{
    DefaultTokenAction, LocalTokenAction, ParentDelegateAction, PrivateProviderAction,
    TargetChainAction,
};
use crate::actions::runtime::{
    CacheGuardAction, ConstructAction, InjectPropertiesAction, ResolveArgsAction,
};
use crate::actions::ActionId;
use crate::container::Container;
use crate::error::DiResult;
use crate::metadata::MetadataTable;
use crate::modules::IocModule;
use crate::observer::{DiObserver, Observers};
use crate::reflect::{AsyncSetupFn, Reflects};
use crate::AnyArc;

/// Pool-shared services: the action arena, the decorator→action registries,
/// the reflect and metadata tables and the pre-wired lifecycle scopes.
///
/// Created once when the root container is built and reached by every child
/// through its container handle: an explicit service object passed through
/// the container graph, not a process global.
pub(crate) struct CoreServices {
    pub(crate) actions: ActionRegistry,
    pub(crate) decorators: DecoratorRegistry,
    pub(crate) metadata: MetadataTable,
    pub(crate) reflects: Reflects,
    pub(crate) observers: Observers,
    pub(crate) design_scope: Arc<CompositeAction>,
    pub(crate) runtime_scope: Arc<CompositeAction>,
    pub(crate) resolve_scope: Arc<CompositeAction>,
    pub(crate) escalate_scope: Arc<CompositeAction>,
    pub(crate) async_setups: Mutex<Vec<(AnyArc, AsyncSetupFn, Container)>>,
}

struct PoolInner {
    services: Arc<CoreServices>,
    root: OnceCell<Container>,
    children: Mutex<Vec<Container>>,
}

/// The set of containers sharing one root and one service registry.
///
/// A pool owns exactly one root container; every other container is created
/// through [`ContainerPool::create_child`] and has exactly one parent, fixed
/// at creation. The hierarchy is acyclic by construction, which is what
/// terminates parent delegation.
///
/// # Examples
///
/// ```rust
/// use ferric_ioc::{ContainerPool, Token};
///
/// let pool = ContainerPool::new();
/// let root = pool.root();
/// let child = pool.create_child();
///
/// root.bind_value(&Token::string("answer"), 42usize);
///
/// // `resolve` falls back to the parent chain.
/// let answer = child.resolve::<usize>(&Token::string("answer")).unwrap();
/// assert_eq!(*answer, 42);
/// ```
pub struct ContainerPool {
    inner: Arc<PoolInner>,
}

impl ContainerPool {
    /// Pool with the default action and decorator wiring.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> PoolBuilder {
        PoolBuilder {
            observers: Vec::new(),
        }
    }

    /// The root container.
    pub fn root(&self) -> Container {
        self.inner
            .root
            .get()
            .expect("pool root is wired at construction")
            .clone()
    }

    /// Creates a child of the root.
    pub fn create_child(&self) -> Container {
        self.create_child_of(&self.root())
    }

    /// Creates a child of an arbitrary container of this pool.
    pub fn create_child_of(&self, parent: &Container) -> Container {
        let child = Container::new(self.inner.services.clone(), Some(parent.clone()));
        self.inner.children.lock().unwrap().push(child.clone());
        child
    }

    /// Number of child containers created through this pool.
    pub fn child_count(&self) -> usize {
        self.inner.children.lock().unwrap().len()
    }

    /// The pool's decorator metadata table.
    pub fn metadata(&self) -> &MetadataTable {
        &self.inner.services.metadata
    }

    /// The pool's action arena.
    pub fn actions(&self) -> &ActionRegistry {
        &self.inner.services.actions
    }

    /// The pool's decorator→action registries.
    pub fn decorator_registry(&self) -> &DecoratorRegistry {
        &self.inner.services.decorators
    }

    /// The pool's reflect registry.
    pub fn reflects(&self) -> &Reflects {
        &self.inner.services.reflects
    }

    /// Registers a module into the root container.
    pub fn register_module<M: IocModule>(&self, module: &M) -> DiResult<()> {
        module.register(&self.root())
    }

    /// Registers a module into a specific container of this pool.
    pub fn register_module_in<M: IocModule>(&self, module: &M, container: &Container) -> DiResult<()> {
        module.register(container)
    }

    /// Awaits the async setup hooks queued by registrations, in queue order.
    ///
    /// Hooks run sequentially; each must complete before the next starts,
    /// preserving registration ordering.
    pub async fn setup_async(&self) -> DiResult<()> {
        loop {
            let batch: Vec<(AnyArc, AsyncSetupFn, Container)> = {
                let mut pending = self.inner.services.async_setups.lock().unwrap();
                std::mem::take(&mut *pending)
            };
            if batch.is_empty() {
                return Ok(());
            }
            for (instance, hook, container) in batch {
                hook(instance, container).await?;
            }
        }
    }
}

impl Default for ContainerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ContainerPool {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Fluent pool construction.
pub struct PoolBuilder {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl PoolBuilder {
    /// Attaches an observer notified of registrations and timed resolutions.
    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> ContainerPool {
        let actions = ActionRegistry::new();

        // Unit actions, built on first use.
        actions.register::<RecordReflectAction>();
        actions.register::<BindProviderAction>();
        actions.register::<MarkSingletonAction>();
        actions.register::<CommitReflectAction>();
        actions.register::<RegisterBindingAction>();
        actions.register::<AutorunAction>();
        actions.register::<RouteRegisterAction>();
        actions.register::<CacheGuardAction>();
        actions.register::<ResolveArgsAction>();
        actions.register::<ConstructAction>();
        actions.register::<InjectPropertiesAction>();
        actions.register::<PrivateProviderAction>();
        actions.register::<TargetChainAction>();
        actions.register::<LocalTokenAction>();
        actions.register::<ParentDelegateAction>();
        actions.register::<DefaultTokenAction>();

        // Phase dispatchers: configured instances, one per lifecycle phase.
        let dispatch = |phase: LifePhase, name: &'static str| -> ActionId {
            let action = Arc::new(DecoratorDispatchAction::new(phase, name));
            let id = action.id();
            actions.register_instance(id, action);
            id
        };
        let design_class = dispatch(LifePhase::DesignClass, "dispatch:design-class");
        let design_property = dispatch(LifePhase::DesignProperty, "dispatch:design-property");
        let design_method = dispatch(LifePhase::DesignMethod, "dispatch:design-method");
        let design_parameter = dispatch(LifePhase::DesignParameter, "dispatch:design-parameter");
        let before_construct = dispatch(LifePhase::BeforeConstruct, "dispatch:before-construct");
        let after_construct = dispatch(LifePhase::AfterConstruct, "dispatch:after-construct");
        let runtime_property = dispatch(LifePhase::RuntimeProperty, "dispatch:runtime-property");
        let runtime_method = dispatch(LifePhase::RuntimeMethod, "dispatch:runtime-method");
        let runtime_annotation =
            dispatch(LifePhase::RuntimeAnnotation, "dispatch:runtime-annotation");

        // Lifecycle scopes.
        let design_scope = Arc::new(CompositeAction::new("design-life"));
        design_scope
            .use_action(design_class)
            .use_action(design_property)
            .use_action(design_method)
            .use_action(design_parameter)
            .use_action(ActionId::of::<CommitReflectAction>())
            .use_action(ActionId::of::<RegisterBindingAction>())
            .use_action(ActionId::of::<AutorunAction>());
        actions.register_instance(design_scope.id(), design_scope.clone());

        let runtime_scope = Arc::new(CompositeAction::new("runtime-life"));
        runtime_scope
            .use_action(ActionId::of::<CacheGuardAction>())
            .use_action(before_construct)
            .use_action(ActionId::of::<ResolveArgsAction>())
            .use_action(ActionId::of::<ConstructAction>())
            .use_action(after_construct)
            .use_action(ActionId::of::<InjectPropertiesAction>())
            .use_action(runtime_property)
            .use_action(runtime_method)
            .use_action(runtime_annotation);
        actions.register_instance(runtime_scope.id(), runtime_scope.clone());

        let resolve_scope = Arc::new(CompositeAction::new("service-resolve"));
        resolve_scope
            .use_action(ActionId::of::<PrivateProviderAction>())
            .use_action(ActionId::of::<TargetChainAction>())
            .use_action(ActionId::of::<LocalTokenAction>())
            .use_action(ActionId::of::<ParentDelegateAction>());
        actions.register_instance(resolve_scope.id(), resolve_scope.clone());

        let escalate_scope = Arc::new(CompositeAction::new("route-escalate"));
        escalate_scope
            .use_action(ActionId::of::<BindProviderAction>())
            .use_action(ActionId::of::<RegisterBindingAction>())
            .use_action(ActionId::of::<RouteRegisterAction>());
        actions.register_instance(escalate_scope.id(), escalate_scope.clone());

        // Default decorator wiring.
        let decorators = DecoratorRegistry::new();
        let design_class_defaults = [
            ActionId::of::<RecordReflectAction>(),
            ActionId::of::<BindProviderAction>(),
            ActionId::of::<MarkSingletonAction>(),
        ];
        decorators.register("Injectable", LifePhase::DesignClass, &design_class_defaults);
        decorators.register("Singleton", LifePhase::DesignClass, &design_class_defaults);
        decorators.register(
            "Refs",
            LifePhase::DesignClass,
            &[
                ActionId::of::<RecordReflectAction>(),
                ActionId::of::<BindProviderAction>(),
            ],
        );
        decorators.register(
            "Autorun",
            LifePhase::DesignClass,
            &[ActionId::of::<RecordReflectAction>()],
        );
        decorators.register(
            "IocExt",
            LifePhase::DesignClass,
            &[
                ActionId::of::<RecordReflectAction>(),
                ActionId::of::<BindProviderAction>(),
                ActionId::of::<MarkSingletonAction>(),
                ActionId::of::<RouteRegisterAction>(),
            ],
        );
        decorators.register(
            "AutoWired",
            LifePhase::DesignProperty,
            &[ActionId::of::<RecordReflectAction>()],
        );
        decorators.register(
            "Inject",
            LifePhase::DesignParameter,
            &[ActionId::of::<RecordReflectAction>()],
        );
        decorators.register(
            "Providers",
            LifePhase::DesignMethod,
            &[ActionId::of::<RecordReflectAction>()],
        );

        let services = Arc::new(CoreServices {
            actions,
            decorators,
            metadata: MetadataTable::new(),
            reflects: Reflects::new(),
            observers: Observers::new(self.observers),
            design_scope,
            runtime_scope,
            resolve_scope,
            escalate_scope,
            async_setups: Mutex::new(Vec::new()),
        });

        let root = Container::new(services.clone(), None);
        let inner = Arc::new(PoolInner {
            services,
            root: OnceCell::new(),
            children: Mutex::new(Vec::new()),
        });
        inner
            .root
            .set(root)
            .unwrap_or_else(|_| unreachable!("fresh pool has no root yet"));
        ContainerPool { inner }
    }
}
