//! # ferric-ioc
//!
//! Decorator-metadata driven IoC container with composable action pipelines.
//!
//! ## Features
//!
//! - **Token model**: class, string, symbol and qualified registration
//!   tokens collapsing to one canonical storage key
//! - **Decorator metadata**: positional argument normalization into merged
//!   metadata records, captured in an explicit side-table
//! - **Action pipelines**: registration and resolution behavior composed
//!   from chain-of-responsibility actions, extensible per decorator and
//!   lifecycle phase
//! - **Lifetimes**: singleton, TTL-cached and transient instances
//! - **Scoped containers**: parent/child pools with upward delegation
//! - **Circular dependency detection**: fails fast with the full path
//!
//! ## Quick Start
//!
//! ```rust
//! use ferric_ioc::metadata::{injectable, singleton};
//! use ferric_ioc::{ContainerPool, CtorArgs, DiResult, Injectable, TypeDeclaration};
//! use std::sync::Arc;
//!
//! struct Engine {
//!     cylinders: u8,
//! }
//!
//! impl Injectable for Engine {
//!     fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
//!         Ok(Engine { cylinders: 6 })
//!     }
//! }
//!
//! struct Car {
//!     engine: Arc<Engine>,
//! }
//!
//! impl Injectable for Car {
//!     fn declare(decl: &mut TypeDeclaration<Self>) {
//!         decl.param::<Engine>("engine");
//!     }
//!     fn construct(args: &mut CtorArgs) -> DiResult<Self> {
//!         Ok(Car {
//!             engine: args.take::<Engine>()?,
//!         })
//!     }
//! }
//!
//! let pool = ContainerPool::new();
//! let root = pool.root();
//!
//! // Decorator applications capture metadata before registration.
//! singleton().apply::<Engine>(pool.metadata(), &[]);
//! injectable().apply::<Car>(pool.metadata(), &[]);
//!
//! root.register::<Engine>().unwrap();
//! root.register::<Car>().unwrap();
//!
//! let car_a = root.get_type::<Car>().unwrap();
//! let car_b = root.get_type::<Car>().unwrap();
//! let engine = root.get_type::<Engine>().unwrap();
//!
//! // Cars are transient, the engine they share is a singleton.
//! assert!(!Arc::ptr_eq(&car_a, &car_b));
//! assert!(Arc::ptr_eq(&car_a.engine, &engine));
//! assert!(Arc::ptr_eq(&car_b.engine, &engine));
//! assert_eq!(engine.cylinders, 6);
//! ```
//!
//! ## Resolution
//!
//! [`Container::get`] consults the local container only and returns
//! `Err(DiError::NotFound)` for unregistered tokens, the sentinel outcome.
//! [`Container::resolve`] runs the full service-resolution chain: the
//! requesting target's private providers, the target's declared ancestor
//! chain, the local token, the parent chain up to the root, and finally a
//! caller-supplied default token.
//!
//! ## Extending the pipeline
//!
//! Collaborating layers (aspect weaving, component binding, task engines)
//! never touch the resolution algorithm; they implement
//! [`Action`](actions::Action) and register against the lifecycle phases in
//! [`LifePhase`](actions::registry::LifePhase), or splice into the pre-wired
//! scopes with `use_before`/`use_after`.

// Module declarations
pub mod actions;
pub mod container;
pub mod error;
pub mod lifetime;
pub mod metadata;
pub mod modules;
pub mod observer;
pub mod pool;
pub mod provider;
pub mod reflect;
pub mod token;

// Internal modules
mod internal;

use std::any::Any;
use std::sync::Arc;

/// Type-erased shared instance, the currency of every pipeline.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

// Re-export core types
pub use actions::composite::CompositeAction;
pub use actions::registry::{ActionRegistry, DecoratorRegistry, LifePhase};
pub use actions::{Action, ActionId, IocContext, Next};
pub use container::{Container, ResolveRequest};
pub use error::{DiError, DiResult};
pub use lifetime::Lifetime;
pub use metadata::{ArgMatcher, DecorArg, Decorator, DecoratorKind, Member, Metadata, MetadataTable};
pub use modules::{AsyncModuleSetup, IocModule, ModuleSetup};
pub use observer::{DiObserver, LoggingObserver};
pub use pool::{ContainerPool, PoolBuilder};
pub use provider::{Provider, ProviderList, ProviderMap};
pub use reflect::{
    CtorArgs, Injectable, ParamSpec, PropSpec, Reflects, TypeDeclaration, TypeReflect,
};
pub use token::{token_key_of, Registration, Token, TokenKey};

#[cfg(test)]
mod tests {
    use super::metadata::{injectable, singleton};
    use super::*;
    use std::sync::Arc;

    struct Config {
        port: u16,
    }

    impl Injectable for Config {
        fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
            Ok(Config { port: 8080 })
        }
    }

    #[test]
    fn test_singleton_resolution() {
        let pool = ContainerPool::new();
        let root = pool.root();
        singleton().apply::<Config>(pool.metadata(), &[]);
        root.register::<Config>().unwrap();

        let a = root.get_type::<Config>().unwrap();
        let b = root.get_type::<Config>().unwrap();

        assert_eq!(a.port, 8080);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_resolution() {
        let pool = ContainerPool::new();
        let root = pool.root();
        injectable().apply::<Config>(pool.metadata(), &[]);
        root.register::<Config>().unwrap();

        let a = root.get_type::<Config>().unwrap();
        let b = root.get_type::<Config>().unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_not_found_sentinel() {
        let pool = ContainerPool::new();
        let root = pool.root();

        let result = root.get::<Config>(&Token::of::<Config>());
        assert!(matches!(result, Err(DiError::NotFound(_))));

        let fallback = Arc::new(Config { port: 1 });
        let got = root.get_or(&Token::of::<Config>(), fallback.clone());
        assert!(Arc::ptr_eq(&got, &fallback));
    }

    #[test]
    fn test_value_binding() {
        let pool = ContainerPool::new();
        let root = pool.root();

        assert!(root.bind_value(&Token::string("port"), 8080u16));
        // First registration wins.
        assert!(!root.bind_value(&Token::string("port"), 9090u16));

        let port = root.get::<u16>(&Token::string("port")).unwrap();
        assert_eq!(*port, 8080);
    }
}
