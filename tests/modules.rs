use async_trait::async_trait;

use ferric_ioc::metadata::injectable;
use ferric_ioc::{
    AsyncModuleSetup, Container, ContainerPool, CtorArgs, DiResult, Injectable, IocModule,
    ModuleSetup, Token, TypeDeclaration,
};

struct Repository {
    url: String,
}

impl Injectable for Repository {
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Repository {
            url: "postgres://localhost".to_string(),
        })
    }
}

struct StorageModule;

impl IocModule for StorageModule {
    fn register(&self, container: &Container) -> DiResult<()> {
        container.bind_value(&Token::string("pool-size"), 10usize);
        container.register::<Repository>()?;
        Ok(())
    }
}

#[test]
fn test_module_registration() {
    let pool = ContainerPool::new();
    injectable().apply::<Repository>(pool.metadata(), &[]);
    pool.register_module(&StorageModule).unwrap();

    let root = pool.root();
    assert_eq!(*root.get::<usize>(&Token::string("pool-size")).unwrap(), 10);
    let repo = root.get_type::<Repository>().unwrap();
    assert_eq!(repo.url, "postgres://localhost");
}

#[test]
fn test_module_registration_into_child() {
    let pool = ContainerPool::new();
    let child = pool.create_child();
    injectable().apply::<Repository>(pool.metadata(), &[]);
    pool.register_module_in(&StorageModule, &child).unwrap();

    assert!(child.has(&Token::string("pool-size")));
    assert!(!pool.root().has(&Token::string("pool-size")));
}

struct Boot;

impl Injectable for Boot {
    fn declare(decl: &mut TypeDeclaration<Self>) {
        decl.autorun();
    }
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Boot)
    }
}

impl ModuleSetup for Boot {
    fn setup(&self, container: &Container) -> DiResult<()> {
        container.bind_value(&Token::string("booted"), true);
        Ok(())
    }
}

#[test]
fn test_sync_setup_runs_once_at_registration() {
    let pool = ContainerPool::new();
    let root = pool.root();

    root.register::<Boot>().unwrap();
    assert_eq!(*root.get::<bool>(&Token::string("booted")).unwrap(), true);

    // Re-registering does not run setup again (binding is idempotent and
    // the hook is once-only).
    root.unregister(&Token::string("booted"));
    root.register::<Boot>().unwrap();
    assert!(!root.has(&Token::string("booted")));
}

struct AsyncBoot;

impl Injectable for AsyncBoot {
    fn declare(decl: &mut TypeDeclaration<Self>) {
        decl.autorun_async();
    }
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(AsyncBoot)
    }
}

#[async_trait]
impl AsyncModuleSetup for AsyncBoot {
    async fn setup(&self, container: &Container) -> DiResult<()> {
        tokio::task::yield_now().await;
        container.bind_value(&Token::string("async-booted"), true);
        Ok(())
    }
}

#[tokio::test]
async fn test_async_setup_awaited_by_pool() {
    let pool = ContainerPool::new();
    let root = pool.root();

    root.register::<AsyncBoot>().unwrap();
    // Queued, not yet run.
    assert!(!root.has(&Token::string("async-booted")));

    pool.setup_async().await.unwrap();
    assert_eq!(
        *root.get::<bool>(&Token::string("async-booted")).unwrap(),
        true
    );

    // Draining again is a no-op.
    pool.setup_async().await.unwrap();
}
