use std::sync::{Arc, Mutex};

use ferric_ioc::{
    Action, ActionId, CompositeAction, ContainerPool, DiResult, IocContext, Next,
};

/// Records its name on execution; optionally short-circuits.
struct SpyAction {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
    call_next: bool,
}

impl Action for SpyAction {
    fn execute(&self, ctx: &mut IocContext, next: &mut Next<'_>) -> DiResult<()> {
        self.log.lock().unwrap().push(self.name);
        if self.call_next {
            next.call(ctx)
        } else {
            Ok(())
        }
    }
}

fn spy(
    pool: &ContainerPool,
    name: &'static str,
    log: &Arc<Mutex<Vec<&'static str>>>,
    call_next: bool,
) -> ActionId {
    let id = ActionId::named::<SpyAction>(name);
    pool.actions().register_instance(
        id,
        Arc::new(SpyAction {
            name,
            log: log.clone(),
            call_next,
        }),
    );
    id
}

#[test]
fn test_chain_runs_in_registration_order() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let chain = Arc::new(CompositeAction::new("test-order"));
    chain
        .use_action(spy(&pool, "a", &log, true))
        .use_action(spy(&pool, "b", &log, true))
        .use_action(spy(&pool, "c", &log, true));
    pool.actions().register_instance(chain.id(), chain.clone());

    let mut ctx = IocContext::new(pool.root());
    chain.run(&mut ctx).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_short_circuit_stops_chain_and_enclosing_next() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    // Inner chain short-circuits at "stop"; the outer chain's following
    // action must not run either, because the inner composite never calls
    // its own continuation.
    let inner = Arc::new(CompositeAction::new("test-inner"));
    inner
        .use_action(spy(&pool, "stop", &log, false))
        .use_action(spy(&pool, "inner-after", &log, true));
    pool.actions().register_instance(inner.id(), inner.clone());

    let outer = Arc::new(CompositeAction::new("test-outer"));
    outer
        .use_action(inner.id())
        .use_action(spy(&pool, "outer-after", &log, true));
    pool.actions().register_instance(outer.id(), outer.clone());

    let mut ctx = IocContext::new(pool.root());
    outer.run(&mut ctx).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["stop"]);
}

#[test]
fn test_nested_composite_continues_into_parent_chain() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let inner = Arc::new(CompositeAction::new("test-nested-inner"));
    inner.use_action(spy(&pool, "inner", &log, true));
    pool.actions().register_instance(inner.id(), inner.clone());

    // The inner chain's last `next` is the outer chain's continuation.
    let outer = Arc::new(CompositeAction::new("test-nested-outer"));
    outer
        .use_action(inner.id())
        .use_action(spy(&pool, "outer", &log, true));
    pool.actions().register_instance(outer.id(), outer.clone());

    let mut ctx = IocContext::new(pool.root());
    outer.run(&mut ctx).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["inner", "outer"]);
}

#[test]
fn test_use_before_and_after_splice_at_anchor() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let a = spy(&pool, "a", &log, true);
    let b = spy(&pool, "b", &log, true);
    let c = spy(&pool, "c", &log, true);
    let d = spy(&pool, "d", &log, true);

    let chain = Arc::new(CompositeAction::new("test-splice"));
    chain.use_action(a).use_action(c);
    chain.use_before(b, c);
    chain.use_after(d, a);
    pool.actions().register_instance(chain.id(), chain.clone());

    let mut ctx = IocContext::new(pool.root());
    chain.run(&mut ctx).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["a", "d", "b", "c"]);
}

#[test]
fn test_missing_anchor_appends_at_end() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let a = spy(&pool, "a", &log, true);
    let b = spy(&pool, "b", &log, true);
    let ghost = ActionId::named::<SpyAction>("ghost");

    let chain = Arc::new(CompositeAction::new("test-missing-anchor"));
    chain.use_action(a);
    chain.use_before(b, ghost);
    pool.actions().register_instance(chain.id(), chain.clone());

    let names: Vec<&'static str> = chain.children().iter().map(|id| id.name()).collect();
    assert_eq!(names, vec!["a", "b"]);

    let mut ctx = IocContext::new(pool.root());
    chain.run(&mut ctx).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_unknown_child_is_skipped() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let a = spy(&pool, "a", &log, true);
    let unknown = ActionId::named::<SpyAction>("never-registered");
    let b = spy(&pool, "b", &log, true);

    let chain = Arc::new(CompositeAction::new("test-unknown-child"));
    chain.use_action(a).use_action(unknown).use_action(b);
    pool.actions().register_instance(chain.id(), chain.clone());

    let mut ctx = IocContext::new(pool.root());
    chain.run(&mut ctx).unwrap();

    // The unresolvable link degrades to a skip, not a failure.
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_use_first_prepends() {
    let pool = ContainerPool::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let a = spy(&pool, "a", &log, true);
    let b = spy(&pool, "b", &log, true);

    let chain = Arc::new(CompositeAction::new("test-use-first"));
    chain.use_action(a);
    chain.use_first(b);

    let names: Vec<&'static str> = chain.children().iter().map(|id| id.name()).collect();
    assert_eq!(names, vec!["b", "a"]);
}
