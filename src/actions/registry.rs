//! Action and decorator registries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{Action, ActionId};

/// Lifecycle phase an action list is registered against.
///
/// Design phases run once per (decorator, type) when a type is first
/// registered into a container; runtime phases run on each instantiation.
/// Collaborating subsystems extend the pipeline by registering their own
/// action types against these phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifePhase {
    DesignClass,
    DesignProperty,
    DesignMethod,
    DesignParameter,
    BeforeConstruct,
    AfterConstruct,
    RuntimeProperty,
    RuntimeMethod,
    RuntimeAnnotation,
}

/// Arena of singleton action instances, one per pool.
///
/// Plain action types register a factory and are built lazily on first
/// resolution; configured instances (composites, dispatchers) register
/// directly under their named [`ActionId`]. The same instance is reused for
/// every execution in the pool.
#[derive(Default)]
pub struct ActionRegistry {
    factories: RwLock<HashMap<ActionId, fn() -> Arc<dyn Action>>>,
    instances: RwLock<HashMap<ActionId, Arc<dyn Action>>>,
}

fn build<A: Action + Default>() -> Arc<dyn Action> {
    Arc::new(A::default())
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the plain action type `A`, constructed on first use.
    pub fn register<A: Action + Default>(&self) {
        self.factories
            .write()
            .unwrap()
            .entry(ActionId::of::<A>())
            .or_insert(build::<A> as fn() -> Arc<dyn Action>);
    }

    /// Registers a pre-built instance under an explicit id.
    pub fn register_instance(&self, id: ActionId, action: Arc<dyn Action>) {
        self.instances.write().unwrap().insert(id, action);
    }

    pub fn has(&self, id: &ActionId) -> bool {
        self.instances.read().unwrap().contains_key(id)
            || self.factories.read().unwrap().contains_key(id)
    }

    /// Resolves the singleton instance for `id`, building it on first use.
    pub fn resolve(&self, id: &ActionId) -> Option<Arc<dyn Action>> {
        if let Some(existing) = self.instances.read().unwrap().get(id) {
            return Some(existing.clone());
        }
        let factory = *self.factories.read().unwrap().get(id)?;
        let mut instances = self.instances.write().unwrap();
        Some(instances.entry(*id).or_insert_with(factory).clone())
    }

    /// Resolves a list of ids, silently skipping unknown entries so one
    /// misconfigured extension cannot take down the whole pipeline.
    pub fn resolve_all(&self, ids: &[ActionId]) -> Vec<Arc<dyn Action>> {
        ids.iter().filter_map(|id| self.resolve(id)).collect()
    }
}

/// Per-phase mapping from decorator identity to its ordered action list.
///
/// An action type may appear in several phases; registration order defines
/// execution order for that decorator within one phase.
#[derive(Default)]
pub struct DecoratorRegistry {
    map: RwLock<HashMap<(&'static str, LifePhase), Vec<ActionId>>>,
}

impl DecoratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `actions` to the decorator's list for `phase`.
    pub fn register(&self, decorator: &'static str, phase: LifePhase, actions: &[ActionId]) {
        self.map
            .write()
            .unwrap()
            .entry((decorator, phase))
            .or_default()
            .extend_from_slice(actions);
    }

    /// Whether the decorator has any actions in any phase.
    pub fn has(&self, decorator: &'static str) -> bool {
        self.map
            .read()
            .unwrap()
            .keys()
            .any(|(name, _)| *name == decorator)
    }

    /// Whether the decorator has actions in the given phase.
    pub fn has_in(&self, decorator: &'static str, phase: LifePhase) -> bool {
        self.map
            .read()
            .unwrap()
            .get(&(decorator, phase))
            .is_some_and(|l| !l.is_empty())
    }

    /// Ordered action ids for one (decorator, phase) pair.
    pub fn actions_for(&self, decorator: &'static str, phase: LifePhase) -> Vec<ActionId> {
        self.map
            .read()
            .unwrap()
            .get(&(decorator, phase))
            .cloned()
            .unwrap_or_default()
    }

    /// Ordered action instances for one (decorator, phase) pair, resolved
    /// through the arena.
    pub fn funcs(
        &self,
        registry: &ActionRegistry,
        decorator: &'static str,
        phase: LifePhase,
    ) -> Vec<Arc<dyn Action>> {
        registry.resolve_all(&self.actions_for(decorator, phase))
    }
}
