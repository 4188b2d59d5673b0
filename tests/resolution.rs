use std::sync::Arc;

use ferric_ioc::metadata::{injectable, refs};
use ferric_ioc::{
    ContainerPool, CtorArgs, DecorArg, DiError, DiResult, Injectable, Provider, ProviderMap,
    ResolveRequest, Token, TypeDeclaration,
};

struct BaseWidget;

struct Widget;

impl Injectable for Widget {
    fn declare(decl: &mut TypeDeclaration<Self>) {
        decl.extends::<BaseWidget>();
    }
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Widget)
    }
}

#[derive(Debug)]
struct Service {
    origin: &'static str,
}

impl Injectable for Service {
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Service { origin: "chain" })
    }
}

fn svc_token() -> Token {
    Token::string("svc")
}

/// Pool with Widget registered in a child, a `Refs`-declared chain provider,
/// and a parent-level plain binding.
fn fixture(private: bool, chain: bool) -> (ContainerPool, ferric_ioc::Container) {
    let pool = ContainerPool::new();
    let root = pool.root();
    let child = pool.create_child();

    injectable().apply::<Widget>(pool.metadata(), &[]);
    child.register::<Widget>().unwrap();

    if chain {
        // Service provides the token specifically for BaseWidget targets.
        refs().apply::<Service>(
            pool.metadata(),
            &[
                DecorArg::Token(svc_token()),
                DecorArg::token_of::<BaseWidget>(),
            ],
        );
        child.register::<Service>().unwrap();
    }

    root.bind_value(&svc_token(), Service { origin: "parent" });

    if private {
        child.register_private::<Widget>(
            ProviderMap::new()
                .provide(Provider::value_for(svc_token(), Service { origin: "private" })),
        );
    }

    (pool, child)
}

fn resolve_for_widget(container: &ferric_ioc::Container) -> Arc<Service> {
    container
        .resolve_with::<Service>(ResolveRequest::new(svc_token()).target(Token::of::<Widget>()))
        .unwrap()
}

#[test]
fn test_private_provider_wins() {
    let (_pool, child) = fixture(true, true);
    assert_eq!(resolve_for_widget(&child).origin, "private");
}

#[test]
fn test_target_chain_wins_without_private() {
    let (_pool, child) = fixture(false, true);
    assert_eq!(resolve_for_widget(&child).origin, "chain");
}

#[test]
fn test_parent_wins_without_private_and_chain() {
    let (_pool, child) = fixture(false, false);
    assert_eq!(resolve_for_widget(&child).origin, "parent");
}

#[test]
fn test_removing_private_falls_back_to_chain() {
    let (_pool, child) = fixture(true, true);
    assert_eq!(resolve_for_widget(&child).origin, "private");

    child.unregister_private::<Widget>();
    assert_eq!(resolve_for_widget(&child).origin, "chain");
}

#[test]
fn test_ancestor_private_map_is_consulted() {
    let pool = ContainerPool::new();
    let child = pool.create_child();

    injectable().apply::<Widget>(pool.metadata(), &[]);
    child.register::<Widget>().unwrap();

    // Private providers registered against the declared ancestor apply to
    // the derived target as well.
    child.register_private::<BaseWidget>(
        ProviderMap::new()
            .provide(Provider::value_for(svc_token(), Service { origin: "base-private" })),
    );

    assert_eq!(resolve_for_widget(&child).origin, "base-private");
}

#[test]
fn test_refs_binding_is_invisible_to_plain_lookup() {
    let (_pool, child) = fixture(false, true);

    // Target-bound providers only answer target-qualified resolution.
    let plain = child.resolve::<Service>(&svc_token()).unwrap();
    assert_eq!(plain.origin, "parent");
    assert!(child.get::<Service>(&svc_token()).is_err());
}

#[test]
fn test_default_token_fallback() {
    let pool = ContainerPool::new();
    let root = pool.root();
    root.bind_value(&Token::string("fallback"), 7usize);

    let got = root
        .resolve_with::<usize>(
            ResolveRequest::new(Token::string("missing")).default_token(Token::string("fallback")),
        )
        .unwrap();
    assert_eq!(*got, 7);

    let err = root.resolve::<usize>(&Token::string("missing"));
    assert!(matches!(err, Err(DiError::NotFound(_))));
}

struct Dep {
    tag: &'static str,
}

impl Injectable for Dep {
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Dep { tag: "constructed" })
    }
}

struct Consumer {
    dep: Arc<Dep>,
}

impl Injectable for Consumer {
    fn declare(decl: &mut TypeDeclaration<Self>) {
        decl.param::<Dep>("dep");
    }
    fn construct(args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Consumer {
            dep: args.take::<Dep>()?,
        })
    }
}

#[test]
fn test_dependency_auto_registration() {
    let pool = ContainerPool::new();
    let root = pool.root();

    injectable().apply::<Dep>(pool.metadata(), &[]);
    injectable().apply::<Consumer>(pool.metadata(), &[]);
    // Dep is never registered explicitly; its decorator hook registers it
    // when Consumer's constructor first needs it.
    root.register::<Consumer>().unwrap();

    let consumer = root.get_type::<Consumer>().unwrap();
    assert_eq!(consumer.dep.tag, "constructed");
    assert!(root.has(&Token::of::<Dep>()));
}

#[test]
fn test_call_site_provider_overrides_constructor_argument() {
    let pool = ContainerPool::new();
    let root = pool.root();

    injectable().apply::<Dep>(pool.metadata(), &[]);
    injectable().apply::<Consumer>(pool.metadata(), &[]);
    root.register::<Consumer>().unwrap();

    let overridden = root
        .resolve_with::<Consumer>(
            ResolveRequest::new(Token::of::<Consumer>())
                .provider(Provider::value_for(Token::of::<Dep>(), Dep { tag: "override" })),
        )
        .unwrap();
    assert_eq!(overridden.dep.tag, "override");

    let plain = root.get_type::<Consumer>().unwrap();
    assert_eq!(plain.dep.tag, "constructed");
}

struct Plain;

struct NeedsPlain {
    _dep: Arc<Plain>,
}

impl Injectable for NeedsPlain {
    fn declare(decl: &mut TypeDeclaration<Self>) {
        decl.param::<Plain>("dep");
    }
    fn construct(args: &mut CtorArgs) -> DiResult<Self> {
        Ok(NeedsPlain {
            _dep: args.take::<Plain>()?,
        })
    }
}

#[test]
fn test_unannotated_dependency_is_not_auto_registered() {
    let pool = ContainerPool::new();
    let root = pool.root();

    injectable().apply::<NeedsPlain>(pool.metadata(), &[]);
    root.register::<NeedsPlain>().unwrap();

    // Plain carries no decorator metadata, so nothing registers it.
    let result = root.get_type::<NeedsPlain>();
    assert!(matches!(result, Err(DiError::NotFound(_))));
    assert!(!root.has(&Token::of::<Plain>()));
}
