//! Explicit providers.
//!
//! Providers supply values for tokens outside the container's binding map:
//! call-site provider lists override constructor/property resolution for one
//! `resolve` call, and target-private [`ProviderMap`]s give a requesting type
//! its own overrides during service resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::token::{Token, TokenKey};
use crate::AnyArc;

type ProviderFactory = Arc<dyn Fn(&Container) -> DiResult<AnyArc> + Send + Sync>;

/// One explicit provider: a token plus the way to produce its value.
#[derive(Clone)]
pub enum Provider {
    /// Fixed instance
    Value { token: Token, value: AnyArc },
    /// Factory invoked per resolution
    Factory {
        token: Token,
        factory: ProviderFactory,
    },
    /// Redirect to another registered token
    Existing { token: Token, use_token: Token },
}

impl Provider {
    /// Provides `value` for the class token of `T`.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Provider::Value {
            token: Token::of::<T>(),
            value: Arc::new(value),
        }
    }

    /// Provides `value` for an explicit token.
    pub fn value_for<T: Send + Sync + 'static>(token: Token, value: T) -> Self {
        Provider::Value {
            token,
            value: Arc::new(value),
        }
    }

    /// Provides via a factory for an explicit token.
    pub fn factory<T, F>(token: Token, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        Provider::Factory {
            token,
            factory: Arc::new(move |c: &Container| factory(c).map(|v| Arc::new(v) as AnyArc)),
        }
    }

    /// Provides `token` by resolving `use_token` instead.
    pub fn existing(token: Token, use_token: Token) -> Self {
        Provider::Existing { token, use_token }
    }

    pub fn token(&self) -> &Token {
        match self {
            Provider::Value { token, .. }
            | Provider::Factory { token, .. }
            | Provider::Existing { token, .. } => token,
        }
    }

    pub(crate) fn produce(&self, container: &Container) -> DiResult<AnyArc> {
        match self {
            Provider::Value { value, .. } => Ok(value.clone()),
            Provider::Factory { factory, .. } => factory(container),
            Provider::Existing { use_token, .. } => container.get_key(&use_token.key()),
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Value { token, .. } => f.debug_tuple("Value").field(token).finish(),
            Provider::Factory { token, .. } => f.debug_tuple("Factory").field(token).finish(),
            Provider::Existing { token, use_token } => f
                .debug_tuple("Existing")
                .field(token)
                .field(use_token)
                .finish(),
        }
    }
}

/// Ordered call-site provider list.
///
/// Consulted before the container during constructor-argument and property
/// resolution; the first provider whose token matches wins.
#[derive(Clone, Debug, Default)]
pub struct ProviderList {
    items: Vec<Provider>,
}

impl ProviderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Provider) -> Self {
        self.items.push(provider);
        self
    }

    pub fn push(&mut self, provider: Provider) {
        self.items.push(provider);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn find(&self, key: &TokenKey) -> Option<&Provider> {
        self.items.iter().find(|p| &p.token().key() == key)
    }

    pub(crate) fn resolve(&self, container: &Container, key: &TokenKey) -> Option<DiResult<AnyArc>> {
        self.find(key).map(|p| p.produce(container))
    }
}

impl From<Vec<Provider>> for ProviderList {
    fn from(items: Vec<Provider>) -> Self {
        Self { items }
    }
}

impl FromIterator<Provider> for ProviderList {
    fn from_iter<I: IntoIterator<Item = Provider>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Target-private provider map.
///
/// Registered against a requesting type via
/// [`Container::register_private`](crate::Container::register_private); the
/// service-resolution chain consults it before any other lookup when that
/// type is the requesting target.
#[derive(Clone, Debug, Default)]
pub struct ProviderMap {
    map: HashMap<TokenKey, Provider>,
}

impl ProviderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider keyed by its own token.
    pub fn provide(mut self, provider: Provider) -> Self {
        self.map.insert(provider.token().key(), provider);
        self
    }

    pub fn insert(&mut self, provider: Provider) {
        self.map.insert(provider.token().key(), provider);
    }

    pub fn get(&self, key: &TokenKey) -> Option<&Provider> {
        self.map.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn resolve(&self, container: &Container, key: &TokenKey) -> Option<DiResult<AnyArc>> {
        self.get(key).map(|p| p.produce(container))
    }
}
