//! The action pipeline.
//!
//! An [`Action`] is an atomic, pool-bound unit of work following a
//! chain-of-responsibility contract: `execute(ctx, next)` either calls
//! `next` exactly once to continue the chain, or returns without calling it
//! to short-circuit (typically because the desired value has already been
//! placed on the context). Actions are stateless; one singleton instance per
//! pool is resolved through the [`ActionRegistry`](registry::ActionRegistry).

pub mod composite;
pub mod design;
pub mod registry;
pub mod resolve;
pub mod runtime;

use std::any::TypeId;
use std::sync::Arc;

use crate::container::{Container, Producer};
use crate::error::DiResult;
use crate::lifetime::Lifetime;
use crate::provider::ProviderList;
use crate::reflect::TypeReflect;
use crate::token::TokenKey;
use crate::AnyArc;

/// One step in a registration or resolution pipeline.
///
/// Implementations must either call `next.call(ctx)` exactly once to
/// continue, or intentionally omit the call to short-circuit the remainder
/// of the chain. Errors propagate to the top-level `register`/`get` caller
/// and abort only that one operation.
pub trait Action: Send + Sync + 'static {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()>;
}

/// Identity of an action in a registry or composite child list.
///
/// Plain actions are identified by their Rust type; composite and dispatch
/// instances additionally carry an instance name so several configured
/// instances of one type can coexist in the arena.
#[derive(Debug, Clone, Copy)]
pub struct ActionId {
    type_id: TypeId,
    name: &'static str,
}

impl ActionId {
    /// Identity of the plain action type `A`.
    pub fn of<A: Action>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            name: std::any::type_name::<A>(),
        }
    }

    /// Identity of a named instance of action type `A`.
    pub fn named<A: Action>(name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ActionId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for ActionId {}

impl std::hash::Hash for ActionId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

/// Continuation handle passed to [`Action::execute`].
///
/// Walks the remaining actions of the current chain; once they are
/// exhausted, control falls through to the enclosing chain's tail, which is
/// how nested composites splice into their parent.
pub struct Next<'n> {
    actions: &'n [Arc<dyn Action>],
    tail: &'n mut dyn FnMut(&mut IocContext) -> DiResult<()>,
}

impl<'n> Next<'n> {
    /// Continues the chain with the next action (or the tail when the chain
    /// is exhausted).
    pub fn call(&mut self, ctx: &mut IocContext) -> DiResult<()> {
        match self.actions.split_first() {
            None => (self.tail)(ctx),
            Some((head, rest)) => {
                let mut next = Next {
                    actions: rest,
                    tail: &mut *self.tail,
                };
                head.execute(ctx, &mut next)
            }
        }
    }
}

/// Runs `actions` as a chain over `ctx`, falling through to `tail` when the
/// last action calls its continuation.
pub(crate) fn run_chain(
    actions: &[Arc<dyn Action>],
    ctx: &mut IocContext,
    tail: &mut dyn FnMut(&mut IocContext) -> DiResult<()>,
) -> DiResult<()> {
    let mut next = Next { actions, tail };
    next.call(ctx)
}

/// Per-operation pipeline state.
///
/// A context is exclusively owned by one `register`/`get`/`resolve` call;
/// chains never share contexts, so no synchronization is needed. Parent
/// delegation rebinds [`IocContext::set_container`] before re-invoking a
/// scope against the parent.
pub struct IocContext {
    container: Container,
    /// Canonical key being registered or resolved
    pub token: Option<TokenKey>,
    /// Requesting target for service resolution
    pub target: Option<(TypeId, &'static str)>,
    /// Concrete type behind the current binding or registration
    pub type_id: Option<(TypeId, &'static str)>,
    /// Decorator currently being dispatched
    pub decorator: Option<&'static str>,
    /// Call-site providers
    pub providers: ProviderList,
    /// Materialized constructor arguments
    pub args: Vec<AnyArc>,
    /// Instance under construction (before wrapping)
    pub instance: Option<Box<dyn std::any::Any + Send + Sync>>,
    /// Final resolved value; setting this short-circuits downstream steps
    pub resolved: Option<AnyArc>,
    /// Fallback token applied after the resolution chain is exhausted
    pub default_token: Option<TokenKey>,
    /// Keys the previous resolution steps tried, for later steps to observe
    pub attempted: Vec<TokenKey>,
    pub(crate) producer: Option<Producer>,
    pub(crate) lifetime: Option<Lifetime>,
    pub(crate) reflect: Option<TypeReflect>,
}

impl IocContext {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            token: None,
            target: None,
            type_id: None,
            decorator: None,
            providers: ProviderList::new(),
            args: Vec::new(),
            instance: None,
            resolved: None,
            default_token: None,
            attempted: Vec::new(),
            producer: None,
            lifetime: None,
            reflect: None,
        }
    }

    /// Container the chain currently operates against.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Rebinds the context to another container (parent delegation).
    pub fn set_container(&mut self, container: Container) {
        self.container = container;
    }

    pub fn take_resolved(&mut self) -> Option<AnyArc> {
        self.resolved.take()
    }
}
