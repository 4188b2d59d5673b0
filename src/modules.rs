//! Modular registration and setup hooks.

use async_trait::async_trait;

use crate::container::Container;
use crate::error::DiResult;

/// A module that registers tokens and types into a container.
///
/// # Example
///
/// ```rust
/// use ferric_ioc::{Container, ContainerPool, DiResult, IocModule, Token};
///
/// struct ConfigModule;
///
/// impl IocModule for ConfigModule {
///     fn register(&self, container: &Container) -> DiResult<()> {
///         container.bind_value(&Token::string("db-url"), "postgres://localhost".to_string());
///         Ok(())
///     }
/// }
///
/// let pool = ContainerPool::new();
/// pool.register_module(&ConfigModule).unwrap();
/// let url = pool.root().get::<String>(&Token::string("db-url")).unwrap();
/// assert_eq!(&*url, "postgres://localhost");
/// ```
pub trait IocModule {
    fn register(&self, container: &Container) -> DiResult<()>;
}

/// Synchronous setup hook, run once at registration time for types declared
/// with [`TypeDeclaration::autorun`](crate::TypeDeclaration::autorun).
pub trait ModuleSetup: Send + Sync {
    fn setup(&self, container: &Container) -> DiResult<()>;
}

/// Asynchronous setup hook for types declared with
/// [`TypeDeclaration::autorun_async`](crate::TypeDeclaration::autorun_async).
///
/// Queued at registration time and awaited in order by
/// [`ContainerPool::setup_async`](crate::ContainerPool::setup_async).
#[async_trait]
pub trait AsyncModuleSetup: Send + Sync {
    async fn setup(&self, container: &Container) -> DiResult<()>;
}
