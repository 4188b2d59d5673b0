//! Runtime actions: run on each instantiation/resolution of a token.

use super::{Action, IocContext, Next};
use crate::container::Producer;
use crate::error::{DiError, DiResult};
use crate::lifetime::Lifetime;
use crate::metadata::{Member, CONSTRUCTOR};
use crate::reflect::CtorArgs;
use crate::AnyArc;

/// Singleton/TTL short-circuit plus store-after-construction.
///
/// Placed first in the runtime scope: a cache hit sets the resolved value
/// and skips the rest of the chain. After the chain runs, the instance under
/// construction is wrapped and cached according to the binding's lifetime;
/// the stored copy wins when another thread raced the construction, so
/// singleton identity is stable.
#[derive(Default)]
pub struct CacheGuardAction;

impl Action for CacheGuardAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let Some(key) = ctx.token.clone() else {
            return next.call(ctx);
        };
        let lifetime = ctx.lifetime.unwrap_or(Lifetime::Transient);
        let container = ctx.container().clone();

        if let Some(cached) = container.cached(&key, lifetime) {
            ctx.resolved = Some(cached);
            return Ok(());
        }

        next.call(ctx)?;

        if ctx.resolved.is_none() {
            if let Some(boxed) = ctx.instance.take() {
                let arc: AnyArc = boxed.into();
                ctx.resolved = Some(arc);
            }
        }
        if let Some(value) = ctx.resolved.take() {
            ctx.resolved = Some(container.store_cached(&key, lifetime, value));
        }
        Ok(())
    }
}

/// Materializes constructor arguments for type-backed bindings.
///
/// Order of precedence per parameter: parameter decorator metadata override,
/// then the declared design token; values come from the call-site provider
/// list first, then the container (auto-registering decorated dependency
/// types on demand).
#[derive(Default)]
pub struct ResolveArgsAction;

impl Action for ResolveArgsAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let Some(Producer::Type(type_id)) = ctx.producer.clone() else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();
        let Some(reflect) = container.reflects().get(type_id) else {
            return next.call(ctx);
        };

        for (index, param) in reflect.params.iter().enumerate() {
            let override_token = container
                .metadata()
                .merged_metadata(type_id, Member::Parameter(CONSTRUCTOR, index))
                .and_then(|md| md.provide);
            let key = override_token
                .map(|t| t.key())
                .unwrap_or_else(|| param.token.key());

            let value = match ctx.providers.resolve(&container, &key) {
                Some(result) => result?,
                None => container.resolve_dependency(&key)?,
            };
            ctx.args.push(value);
        }
        next.call(ctx)
    }
}

/// Produces the raw instance: clones bound instances, invokes bound
/// factories, or drives the reflected constructor with the materialized
/// arguments.
#[derive(Default)]
pub struct ConstructAction;

impl Action for ConstructAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        match ctx.producer.clone() {
            Some(Producer::Instance(value)) => {
                ctx.resolved = Some(value);
                next.call(ctx)
            }
            Some(Producer::Factory(factory)) => {
                let container = ctx.container().clone();
                ctx.resolved = Some(factory(&container)?);
                next.call(ctx)
            }
            Some(Producer::Type(type_id)) => {
                let container = ctx.container().clone();
                let reflect = container.reflects().get(type_id).ok_or_else(|| {
                    DiError::NotFound(
                        ctx.token
                            .as_ref()
                            .map(|k| k.to_string())
                            .unwrap_or_default(),
                    )
                })?;
                let args = CtorArgs::new(std::mem::take(&mut ctx.args));
                ctx.instance = Some((reflect.ctor)(args)?);
                next.call(ctx)
            }
            _ => next.call(ctx),
        }
    }
}

/// Injects declared properties into the instance under construction.
///
/// Property decorator metadata overrides the declared token; values come
/// from the call-site provider list first, then the container.
#[derive(Default)]
pub struct InjectPropertiesAction;

impl Action for InjectPropertiesAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let Some(Producer::Type(type_id)) = ctx.producer.clone() else {
            return next.call(ctx);
        };
        let Some(mut boxed) = ctx.instance.take() else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();

        if let Some(reflect) = container.reflects().get(type_id) {
            for prop in &reflect.props {
                let override_token = container
                    .metadata()
                    .merged_metadata(type_id, Member::Property(prop.name))
                    .and_then(|md| md.provide);
                let key = override_token
                    .map(|t| t.key())
                    .unwrap_or_else(|| prop.token.key());

                let value = match ctx.providers.resolve(&container, &key) {
                    Some(result) => result?,
                    None => container.resolve_dependency(&key)?,
                };
                (prop.setter)(&mut *boxed, value)?;
            }
        }
        ctx.instance = Some(boxed);
        next.call(ctx)
    }
}
