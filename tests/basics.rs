use ferric_ioc::metadata::{injectable, singleton};
use ferric_ioc::{
    ContainerPool, CtorArgs, DiError, DiResult, Injectable, Lifetime, Token,
};
use std::sync::{Arc, Mutex};

struct Config {
    port: u16,
}

impl Injectable for Config {
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Config { port: 8080 })
    }
}

#[test]
fn test_value_binding() {
    let pool = ContainerPool::new();
    let root = pool.root();

    root.bind_value(&Token::string("port"), 8080u16);
    root.bind_value(&Token::string("name"), "server".to_string());

    let port = root.get::<u16>(&Token::string("port")).unwrap();
    let name = root.get::<String>(&Token::string("name")).unwrap();

    assert_eq!(*port, 8080);
    assert_eq!(name.as_str(), "server");
}

#[test]
fn test_factory_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let pool = ContainerPool::new();
    let root = pool.root();
    root.bind_factory::<String, _>(&Token::string("id"), Lifetime::Transient, move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        Ok(format!("instance-{}", *c))
    });

    let a = root.get::<String>(&Token::string("id")).unwrap();
    let b = root.get::<String>(&Token::string("id")).unwrap();
    let c = root.get::<String>(&Token::string("id")).unwrap();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_factory_singleton_runs_once() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let pool = ContainerPool::new();
    let root = pool.root();
    root.bind_factory::<String, _>(&Token::string("id"), Lifetime::Singleton, move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        Ok(format!("instance-{}", *c))
    });

    let a = root.get::<String>(&Token::string("id")).unwrap();
    let b = root.get::<String>(&Token::string("id")).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*counter.lock().unwrap(), 1);
}

#[test]
fn test_registration_is_idempotent() {
    let pool = ContainerPool::new();
    let root = pool.root();

    // First binding wins; re-binding the key is a no-op.
    assert!(root.bind_value(&Token::string("v"), 1usize));
    assert!(!root.bind_value(&Token::string("v"), 2usize));
    assert_eq!(*root.get::<usize>(&Token::string("v")).unwrap(), 1);

    // Same contract for reflected types.
    singleton().apply::<Config>(pool.metadata(), &[]);
    root.register::<Config>().unwrap();
    let first = root.get_type::<Config>().unwrap();
    root.register::<Config>().unwrap();
    let second = root.get_type::<Config>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_not_found_is_a_value_not_a_panic() {
    let pool = ContainerPool::new();
    let root = pool.root();

    match root.get::<u16>(&Token::string("missing")) {
        Err(DiError::NotFound(name)) => assert_eq!(name, "missing"),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }

    let fallback = Arc::new(17u16);
    let got = root.get_or(&Token::string("missing"), fallback.clone());
    assert!(Arc::ptr_eq(&got, &fallback));
}

#[test]
fn test_replace_overwrites_and_evicts() {
    let pool = ContainerPool::new();
    let root = pool.root();

    root.bind_value(&Token::string("v"), 1usize);
    assert_eq!(*root.get::<usize>(&Token::string("v")).unwrap(), 1);

    root.replace_value(&Token::string("v"), 2usize);
    assert_eq!(*root.get::<usize>(&Token::string("v")).unwrap(), 2);
}

#[test]
fn test_unregister_drops_binding_and_cache() {
    let pool = ContainerPool::new();
    let root = pool.root();

    root.bind_value(&Token::string("v"), 1usize);
    assert!(root.has(&Token::string("v")));
    let _ = root.get::<usize>(&Token::string("v")).unwrap();

    root.unregister(&Token::string("v"));
    assert!(!root.has(&Token::string("v")));
    assert!(root.get::<usize>(&Token::string("v")).is_err());
}

#[test]
fn test_alias_binding_through_decorator() {
    let pool = ContainerPool::new();
    let root = pool.root();

    injectable().apply::<Config>(pool.metadata(), &[ferric_ioc::DecorArg::string("v2")]);
    root.register::<Config>().unwrap();

    assert!(root.has_alias(&Token::of::<Config>(), "v2"));
    let qualified = Token::of::<Config>().with_alias("v2");
    let config = root.get::<Config>(&qualified).unwrap();
    assert_eq!(config.port, 8080);
}

#[test]
fn test_type_mismatch() {
    let pool = ContainerPool::new();
    let root = pool.root();

    root.bind_value(&Token::string("v"), 1usize);
    let result = root.get::<String>(&Token::string("v"));
    assert!(matches!(result, Err(DiError::TypeMismatch(_))));
}
