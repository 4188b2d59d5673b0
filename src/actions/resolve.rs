//! Service-resolution actions.
//!
//! The resolution chain answers "the provider of token T for requesting
//! target X": target-private providers, then the target's declared ancestor
//! chain, then the plain local token, then the parent container, then a
//! caller-supplied default. The first step that produces an instance
//! short-circuits the chain; every step records the keys it tried on the
//! context so later steps can observe them.

use std::sync::Arc;

use super::{run_chain, Action, IocContext, Next};
use crate::error::DiResult;
use crate::token::TokenKey;

/// Step 1: the requesting target's own private provider map.
#[derive(Default)]
pub struct PrivateProviderAction;

impl Action for PrivateProviderAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if ctx.resolved.is_some() {
            return Ok(());
        }
        let (Some(token), Some((target_id, target_name))) = (ctx.token.clone(), ctx.target) else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();
        let key = TokenKey::PrivateOf(target_id, target_name);
        if let Some(map) = container.private_providers(&key) {
            if let Some(result) = map.resolve(&container, &token) {
                ctx.resolved = Some(result?);
                return Ok(());
            }
        }
        ctx.attempted.push(key);
        next.call(ctx)
    }
}

/// Step 2: walk the target's declared ancestor chain, most-derived first,
/// retrying target-bound lookups (ref bindings, ancestor private maps)
/// against each ancestor as the current target reference.
#[derive(Default)]
pub struct TargetChainAction;

impl Action for TargetChainAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if ctx.resolved.is_some() {
            return Ok(());
        }
        let (Some(token), Some((target_id, target_name))) = (ctx.token.clone(), ctx.target) else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();

        let mut chain: Vec<(std::any::TypeId, &'static str)> = vec![(target_id, target_name)];
        if let Some(reflect) = container.reflects().get(target_id) {
            chain.extend(reflect.extends.iter().copied());
        }

        for (index, (ancestor_id, ancestor_name)) in chain.into_iter().enumerate() {
            let ref_key = TokenKey::TargetRef(Box::new(token.clone()), ancestor_id, ancestor_name);
            if container.has_key(&ref_key) {
                ctx.resolved = Some(container.get_key_with(&ref_key, ctx.providers.clone())?);
                return Ok(());
            }
            ctx.attempted.push(ref_key);

            // The exact target's private map was already step 1.
            if index > 0 {
                let private_key = TokenKey::PrivateOf(ancestor_id, ancestor_name);
                if let Some(map) = container.private_providers(&private_key) {
                    if let Some(result) = map.resolve(&container, &token) {
                        ctx.resolved = Some(result?);
                        return Ok(());
                    }
                }
                ctx.attempted.push(private_key);
            }
        }
        next.call(ctx)
    }
}

/// Step 3: plain token lookup in the current container.
#[derive(Default)]
pub struct LocalTokenAction;

impl Action for LocalTokenAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if ctx.resolved.is_some() {
            return Ok(());
        }
        let Some(token) = ctx.token.clone() else {
            return next.call(ctx);
        };
        let container = ctx.container().clone();
        if container.has_key(&token) {
            ctx.resolved = Some(container.get_key_with(&token, ctx.providers.clone())?);
            return Ok(());
        }
        ctx.attempted.push(token);
        next.call(ctx)
    }
}

/// Step 4: delegate the whole chain to the parent container.
///
/// The context is rebound to the parent and the resolution scope re-invoked
/// there, recursively up to the root; the original container is restored
/// afterwards so the default-token fallback still runs against the
/// requesting container.
#[derive(Default)]
pub struct ParentDelegateAction;

impl Action for ParentDelegateAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if ctx.resolved.is_some() {
            return Ok(());
        }
        if let Some(parent) = ctx.container().parent() {
            let child = ctx.container().clone();
            ctx.set_container(parent);
            let scope: Arc<dyn Action> = child.resolve_scope();
            let actions = [scope];
            let mut tail = |_: &mut IocContext| Ok(());
            let result = run_chain(&actions, ctx, &mut tail);
            ctx.set_container(child);
            result?;
            if ctx.resolved.is_some() {
                return Ok(());
            }
        }
        next.call(ctx)
    }
}

/// Step 5: caller-supplied default token.
#[derive(Default)]
pub struct DefaultTokenAction;

impl Action for DefaultTokenAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        if ctx.resolved.is_some() {
            return Ok(());
        }
        if let Some(key) = ctx.default_token.clone() {
            let container = ctx.container().clone();
            if container.has_key(&key) {
                ctx.resolved = Some(container.get_key_with(&key, ctx.providers.clone())?);
                return Ok(());
            }
            ctx.attempted.push(key);
        }
        next.call(ctx)
    }
}
