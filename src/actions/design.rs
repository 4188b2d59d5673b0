//! Design-time actions: run once per (decorator, type) when a type is first
//! registered into a container.

use std::borrow::Cow;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::registry::LifePhase;
use super::{run_chain, Action, ActionId, IocContext, Next};
use crate::error::DiResult;
use crate::metadata::{Member, MemberKind};
use crate::token::TokenKey;

fn phase_kind(phase: LifePhase) -> MemberKind {
    match phase {
        LifePhase::DesignClass
        | LifePhase::BeforeConstruct
        | LifePhase::AfterConstruct
        | LifePhase::RuntimeAnnotation => MemberKind::Class,
        LifePhase::DesignProperty | LifePhase::RuntimeProperty => MemberKind::Property,
        LifePhase::DesignMethod | LifePhase::RuntimeMethod => MemberKind::Method,
        LifePhase::DesignParameter => MemberKind::Parameter,
    }
}

/// Dispatches one lifecycle phase: for every decorator applied to the
/// current type (of the member kind this phase covers) that has actions
/// registered for the phase, runs that decorator's action chain.
///
/// Each decorator's chain runs to completion independently; the phase then
/// continues regardless of whether individual chains short-circuited.
pub struct DecoratorDispatchAction {
    phase: LifePhase,
    name: &'static str,
}

impl DecoratorDispatchAction {
    pub fn new(phase: LifePhase, name: &'static str) -> Self {
        Self { phase, name }
    }

    pub fn id(&self) -> ActionId {
        ActionId::named::<DecoratorDispatchAction>(self.name)
    }
}

impl Action for DecoratorDispatchAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let Some((type_id, _)) = ctx.type_id else {
            return next.call(ctx);
        };
        let decorators = ctx
            .container()
            .metadata()
            .decorators_of(type_id, phase_kind(self.phase));

        for decorator in decorators {
            let funcs = {
                let container = ctx.container();
                let registry = container.decorator_registry();
                if !registry.has_in(decorator, self.phase) {
                    continue;
                }
                registry.funcs(container.actions(), decorator, self.phase)
            };
            let saved = ctx.decorator;
            ctx.decorator = Some(decorator);
            let mut tail = |_: &mut IocContext| Ok(());
            let result = run_chain(&funcs, ctx, &mut tail);
            ctx.decorator = saved;
            result?;
        }
        next.call(ctx)
    }
}

/// Records the current decorator on the pending reflect record.
#[derive(Default)]
pub struct RecordReflectAction;

impl Action for RecordReflectAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if let (Some(decorator), Some(reflect)) = (ctx.decorator, ctx.reflect.as_mut()) {
            if !reflect.decorators.contains(&decorator) {
                reflect.decorators.push(decorator);
            }
        }
        next.call(ctx)
    }
}

/// Binds the `provide`/`alias`/`refs` tokens of the current decorator's
/// class metadata to the class being registered.
#[derive(Default)]
pub struct BindProviderAction;

impl Action for BindProviderAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let (Some((type_id, type_name)), Some(decorator)) = (ctx.type_id, ctx.decorator) else {
            return next.call(ctx);
        };
        let Some(md) = ctx
            .container()
            .metadata()
            .metadata(type_id, Member::Class, decorator)
        else {
            return next.call(ctx);
        };

        let class_key = TokenKey::Type(type_id, type_name);
        let container = ctx.container().clone();

        if let Some(target) = &md.refs {
            // Target-bound provider: visible only when the target (or one of
            // its declared ancestors) is the requesting type.
            if let Some((target_id, target_name)) = target.type_info() {
                let base = md
                    .provide
                    .as_ref()
                    .map(|p| p.key())
                    .unwrap_or_else(|| class_key.clone());
                let key = TokenKey::TargetRef(Box::new(base), target_id, target_name);
                container.bind_alias(key, class_key.clone());
            }
        } else if let Some(provide) = &md.provide {
            let key = provide.key_with(md.alias.as_deref());
            container.bind_alias(key, class_key.clone());
        } else if let Some(alias) = &md.alias {
            let key = TokenKey::Aliased(
                Box::new(class_key.clone()),
                Cow::Owned(alias.clone().into_owned()),
            );
            container.bind_alias(key, class_key.clone());
        }
        next.call(ctx)
    }
}

/// Folds the singleton/TTL flags of the current decorator's class metadata
/// into the pending reflect record.
#[derive(Default)]
pub struct MarkSingletonAction;

impl Action for MarkSingletonAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if let (Some((type_id, _)), Some(decorator)) = (ctx.type_id, ctx.decorator) {
            let md = ctx
                .container()
                .metadata()
                .metadata(type_id, Member::Class, decorator);
            if let (Some(md), Some(reflect)) = (md, ctx.reflect.as_mut()) {
                if md.singleton == Some(true) {
                    reflect.singleton = true;
                }
                if let Some(ttl) = md.expires {
                    reflect.expires = Some(ttl);
                }
            }
        }
        next.call(ctx)
    }
}

/// Commits the pending reflect record into the pool registry.
#[derive(Default)]
pub struct CommitReflectAction;

impl Action for CommitReflectAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if let Some(reflect) = ctx.reflect.take() {
            ctx.container().reflects().insert(reflect);
        }
        next.call(ctx)
    }
}

/// Creates the class binding, with the lifetime implied by the committed
/// reflect record. Idempotent: an existing binding for the key wins.
#[derive(Default)]
pub struct RegisterBindingAction;

impl Action for RegisterBindingAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let Some((type_id, type_name)) = ctx.type_id else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();
        // During parent escalation the reflect record is still pending on
        // the context; the committed record covers the normal path.
        let lifetime = ctx
            .reflect
            .as_ref()
            .map(|r| r.lifetime())
            .or_else(|| container.reflects().get(type_id).map(|r| r.lifetime()));
        let Some(lifetime) = lifetime else {
            return next.call(ctx);
        };
        let key = ctx
            .token
            .clone()
            .unwrap_or(TokenKey::Type(type_id, type_name));
        container.bind_type_key(key, type_id, type_name, lifetime);
        next.call(ctx)
    }
}

/// Runs the type's registration-time setup hook once.
///
/// Sync hooks run immediately; async hooks are queued on the pool and
/// awaited by `ContainerPool::setup_async`.
#[derive(Default)]
pub struct AutorunAction;

impl Action for AutorunAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let Some((type_id, type_name)) = ctx.type_id else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();
        let Some(reflect) = container.reflects().get(type_id) else {
            return next.call(ctx);
        };
        if reflect.setup.is_none() && reflect.async_setup.is_none() {
            return next.call(ctx);
        }
        if !reflect.setup_done.swap(true, Ordering::SeqCst) {
            let key = TokenKey::Type(type_id, type_name);
            let instance = container.get_key(&key)?;
            if let Some(setup) = &reflect.setup {
                setup(&instance, &container)?;
            }
            if let Some(setup) = &reflect.async_setup {
                container.queue_async_setup(instance, setup.clone());
            }
        }
        next.call(ctx)
    }
}

/// Escalates the current registration to the parent container.
///
/// Registered for module-level decorators: re-executes the bind/register
/// portion of the design scope with the context rebound to the parent, so a
/// decorator processed inside a child module still populates providers that
/// are visible pool-wide. Terminates at the root, which has no parent.
#[derive(Default)]
pub struct RouteRegisterAction;

impl Action for RouteRegisterAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if let Some(parent) = ctx.container().parent() {
            let child = ctx.container().clone();
            ctx.set_container(parent);
            let scope: Arc<dyn Action> = child.escalate_scope();
            let actions = [scope];
            let mut tail = |_: &mut IocContext| Ok(());
            let result = run_chain(&actions, ctx, &mut tail);
            ctx.set_container(child);
            result?;
        }
        next.call(ctx)
    }
}
