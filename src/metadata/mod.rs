//! Decorator metadata capture.
//!
//! Decorator applications do not rely on a reflection runtime: every
//! application writes a normalized [`Metadata`] record into an explicit
//! side-table keyed by (target type, member, decorator id). The table is a
//! pool-level service; containers of one pool share it.

mod args;
mod decorator;

pub use args::{ArgMatcher, ArgsIterator};
pub use decorator::{
    auto_wired, autorun, inject, injectable, ioc_ext, providers, refs, singleton, Decorator,
    DecoratorKind,
};

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::container::Container;
use crate::error::DiResult;
use crate::provider::Provider;
use crate::token::Token;

/// Name of the synthetic member decorator arguments attach to for
/// constructor parameters.
pub const CONSTRUCTOR: &str = "constructor";

/// Attachment point of a decorator application on its target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Class,
    Property(&'static str),
    Method(&'static str),
    /// Method name plus zero-based parameter index
    Parameter(&'static str, usize),
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Class => MemberKind::Class,
            Member::Property(_) => MemberKind::Property,
            Member::Method(_) => MemberKind::Method,
            Member::Parameter(_, _) => MemberKind::Parameter,
        }
    }
}

/// Member category, used to pick which applied decorators a lifecycle phase
/// dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Class,
    Property,
    Method,
    Parameter,
}

/// Normalized metadata record produced by one decorator application.
///
/// Repeated applications of the same decorator on the same member merge
/// records in place: the later application's explicit fields win, provider
/// lists append.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Alternate token to register the target as
    pub provide: Option<Token>,
    /// Discriminator qualifying `provide` (or the class token)
    pub alias: Option<Cow<'static, str>>,
    /// Cache the resolved instance forever
    pub singleton: Option<bool>,
    /// Cache TTL when not singleton
    pub expires: Option<Duration>,
    /// Target-reference binding: this provider is specific to being injected
    /// into the given target type
    pub refs: Option<Token>,
    /// Explicit providers for constructor/method resolution
    pub providers: Vec<Provider>,
}

impl Metadata {
    /// Merges `other` into `self`; `other`'s explicit fields win.
    pub fn merge(&mut self, other: &Metadata) {
        if other.provide.is_some() {
            self.provide = other.provide.clone();
        }
        if other.alias.is_some() {
            self.alias = other.alias.clone();
        }
        if other.singleton.is_some() {
            self.singleton = other.singleton;
        }
        if other.expires.is_some() {
            self.expires = other.expires;
        }
        if other.refs.is_some() {
            self.refs = other.refs.clone();
        }
        self.providers.extend(other.providers.iter().cloned());
    }
}

/// One positional decorator argument.
///
/// A full [`Metadata`] object short-circuits positional parsing and merges
/// into the accumulator; the other shapes are matched by the decorator's
/// ordered predicate list.
#[derive(Clone)]
pub enum DecorArg {
    /// Full metadata object; always wins over positional inference
    Metadata(Metadata),
    /// A token (typically `provide` or a target reference)
    Token(Token),
    /// A string (typically an alias/discriminator)
    Str(Cow<'static, str>),
    /// A boolean (typically the singleton flag)
    Bool(bool),
    /// A millisecond count (typically the cache TTL)
    Millis(u64),
    /// An explicit provider
    Provider(Provider),
}

impl DecorArg {
    /// Token argument for class `T`.
    pub fn token_of<T: 'static>() -> Self {
        DecorArg::Token(Token::of::<T>())
    }

    pub fn string(s: impl Into<Cow<'static, str>>) -> Self {
        DecorArg::Str(s.into())
    }
}

impl std::fmt::Debug for DecorArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecorArg::Metadata(m) => f.debug_tuple("Metadata").field(m).finish(),
            DecorArg::Token(t) => f.debug_tuple("Token").field(t).finish(),
            DecorArg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            DecorArg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            DecorArg::Millis(n) => f.debug_tuple("Millis").field(n).finish(),
            DecorArg::Provider(p) => f.debug_tuple("Provider").field(&p.token()).finish(),
        }
    }
}

/// Hook that registers a decorated class into a container on demand.
///
/// Recorded when a class decorator is applied to an [`Injectable`] type;
/// dependency auto-registration consults this map, so plain unannotated
/// types are never auto-registered.
///
/// [`Injectable`]: crate::Injectable
pub(crate) type AutoRegister = Arc<dyn Fn(&Container) -> DiResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Applied {
    pub name: &'static str,
    pub member: Member,
}

/// Pool-level side-table of decorator applications.
///
/// One table per [`ContainerPool`](crate::ContainerPool); all containers of
/// the pool read it. Records are created when a [`Decorator`] runs, merged on
/// re-application, and only removed together with the owning type's reflect
/// record on explicit unregistration.
#[derive(Default)]
pub struct MetadataTable {
    records: RwLock<HashMap<(TypeId, Member, &'static str), Metadata>>,
    applied: RwLock<HashMap<TypeId, Vec<Applied>>>,
    auto: RwLock<HashMap<TypeId, AutoRegister>>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one decorator application. `metadata` may be `None` (the
    /// application carried no parseable data); the decorator still counts as
    /// applied.
    pub(crate) fn record(
        &self,
        target: TypeId,
        member: Member,
        decorator: &'static str,
        metadata: Option<Metadata>,
    ) {
        {
            let mut applied = self.applied.write().unwrap();
            let list = applied.entry(target).or_default();
            let entry = Applied {
                name: decorator,
                member,
            };
            if !list.contains(&entry) {
                list.push(entry);
            }
        }
        if let Some(md) = metadata {
            let mut records = self.records.write().unwrap();
            records
                .entry((target, member, decorator))
                .and_modify(|existing| existing.merge(&md))
                .or_insert(md);
        }
    }

    pub(crate) fn record_auto(&self, target: TypeId, hook: AutoRegister) {
        self.auto.write().unwrap().entry(target).or_insert(hook);
    }

    /// Metadata for one (member, decorator) pair.
    pub fn metadata(
        &self,
        target: TypeId,
        member: Member,
        decorator: &'static str,
    ) -> Option<Metadata> {
        self.records
            .read()
            .unwrap()
            .get(&(target, member, decorator))
            .cloned()
    }

    /// Metadata for a member, merged across every decorator applied to it in
    /// application order.
    pub fn merged_metadata(&self, target: TypeId, member: Member) -> Option<Metadata> {
        let applied = self.applied.read().unwrap();
        let list = applied.get(&target)?;
        let records = self.records.read().unwrap();
        let mut out: Option<Metadata> = None;
        for entry in list.iter().filter(|a| a.member == member) {
            if let Some(md) = records.get(&(target, member, entry.name)) {
                out.get_or_insert_with(Metadata::default).merge(md);
            }
        }
        out
    }

    /// Whether the type carries any decorator application at all.
    pub fn is_decorated(&self, target: TypeId) -> bool {
        self.applied
            .read()
            .unwrap()
            .get(&target)
            .is_some_and(|l| !l.is_empty())
    }

    /// Distinct decorator names applied to members of the given kind, in
    /// application order.
    pub fn decorators_of(&self, target: TypeId, kind: MemberKind) -> Vec<&'static str> {
        let applied = self.applied.read().unwrap();
        let mut out = Vec::new();
        if let Some(list) = applied.get(&target) {
            for entry in list.iter().filter(|a| a.member.kind() == kind) {
                if !out.contains(&entry.name) {
                    out.push(entry.name);
                }
            }
        }
        out
    }

    /// Members of the given kind that carry the named decorator.
    pub fn members_with(
        &self,
        target: TypeId,
        kind: MemberKind,
        decorator: &'static str,
    ) -> Vec<Member> {
        let applied = self.applied.read().unwrap();
        let mut out = Vec::new();
        if let Some(list) = applied.get(&target) {
            for entry in list
                .iter()
                .filter(|a| a.member.kind() == kind && a.name == decorator)
            {
                out.push(entry.member);
            }
        }
        out
    }

    pub(crate) fn auto_register(&self, target: TypeId) -> Option<AutoRegister> {
        self.auto.read().unwrap().get(&target).cloned()
    }

    pub(crate) fn forget(&self, target: TypeId) {
        self.applied.write().unwrap().remove(&target);
        self.auto.write().unwrap().remove(&target);
        self.records
            .write()
            .unwrap()
            .retain(|(t, _, _), _| *t != target);
    }
}
