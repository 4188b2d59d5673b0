//! Composite actions.

use std::sync::{Arc, RwLock};

use super::{run_chain, Action, ActionId, IocContext, Next};
use crate::error::DiResult;

/// An action whose body is an ordered list of child actions.
///
/// Children are stored by [`ActionId`] and resolved to their singleton
/// instances from the pool's arena at execution time. The last child's
/// continuation is the composite's own `next`, so composites nest
/// transparently. Chain order is the registration order; `use_before` /
/// `use_after` splice relative to an anchor.
///
/// Anchor-not-found policy: the inserted action is appended at the end.
/// Chain wiring problems degrade to a best-effort position instead of
/// failing the whole pipeline.
pub struct CompositeAction {
    name: &'static str,
    children: RwLock<Vec<ActionId>>,
}

impl CompositeAction {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            children: RwLock::new(Vec::new()),
        }
    }

    /// Identity of this composite instance in the arena.
    pub fn id(&self) -> ActionId {
        ActionId::named::<CompositeAction>(self.name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends a child action.
    pub fn use_action(&self, id: ActionId) -> &Self {
        self.children.write().unwrap().push(id);
        self
    }

    /// Prepends a child action.
    pub fn use_first(&self, id: ActionId) -> &Self {
        self.children.write().unwrap().insert(0, id);
        self
    }

    /// Inserts `id` immediately before `anchor`; appends when the anchor is
    /// not present.
    pub fn use_before(&self, id: ActionId, anchor: ActionId) -> &Self {
        let mut children = self.children.write().unwrap();
        match children.iter().position(|c| *c == anchor) {
            Some(pos) => children.insert(pos, id),
            None => children.push(id),
        }
        self
    }

    /// Inserts `id` immediately after `anchor`; appends when the anchor is
    /// not present.
    pub fn use_after(&self, id: ActionId, anchor: ActionId) -> &Self {
        let mut children = self.children.write().unwrap();
        match children.iter().position(|c| *c == anchor) {
            Some(pos) => children.insert(pos + 1, id),
            None => children.push(id),
        }
        self
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<ActionId> {
        self.children.read().unwrap().clone()
    }

    /// Runs this composite over `ctx` with a terminal no-op continuation.
    pub fn run(&self, ctx: &mut IocContext) -> DiResult<()> {
        let ids = self.children();
        let actions: Vec<Arc<dyn Action>> = ctx.container().actions().resolve_all(&ids);
        let mut tail = |_: &mut IocContext| Ok(());
        run_chain(&actions, ctx, &mut tail)
    }
}

impl Action for CompositeAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        let ids = self.children();
        let actions: Vec<Arc<dyn Action>> = ctx.container().actions().resolve_all(&ids);
        let mut tail = |c: &mut IocContext| next.call(c);
        run_chain(&actions, ctx, &mut tail)
    }
}

impl std::fmt::Debug for CompositeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeAction")
            .field("name", &self.name)
            .field("children", &self.children.read().unwrap().len())
            .finish()
    }
}
