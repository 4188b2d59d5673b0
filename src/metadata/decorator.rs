//! Decorator factories.
//!
//! A [`Decorator`] is an immutable value describing one decorator identity:
//! its name, the member kind it attaches to, the ordered argument matchers
//! that normalize positional call shapes, and an optional metadata extender.
//! Applying it records a [`Metadata`](super::Metadata) record into the pool's
//! [`MetadataTable`](super::MetadataTable).

use std::any::TypeId;
use std::sync::Arc;

use super::args::{
    match_alias, match_expires, match_provide, match_provider, match_refs, match_singleton,
    ArgMatcher, ArgsIterator,
};
use super::{DecorArg, Member, Metadata, MetadataTable};
use crate::reflect::Injectable;

/// Member kind a decorator attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorKind {
    Class,
    Property,
    Method,
    Parameter,
}

/// A decorator identity plus its argument-normalization rules.
///
/// Produced by the factory constructors ([`Decorator::class`],
/// [`Decorator::property`], [`Decorator::method`], [`Decorator::parameter`]);
/// custom matchers and a metadata extender can be layered on top, mirroring
/// the `createClassDecorator(name, argAdapter, metadataExtender)` contract.
///
/// Every decorator accepts: no arguments, a single metadata object, or a
/// positional shorthand defined by its matcher list.
#[derive(Clone)]
pub struct Decorator {
    name: &'static str,
    kind: DecoratorKind,
    matchers: Vec<ArgMatcher>,
    extender: Option<fn(&mut Metadata)>,
}

impl Decorator {
    /// Class decorator with the default positional shape
    /// `(provide, alias, singleton, expires_ms, ref_target)`.
    pub fn class(name: &'static str) -> Self {
        Self {
            name,
            kind: DecoratorKind::Class,
            matchers: vec![
                ArgMatcher::once(match_provide),
                ArgMatcher::once(match_alias),
                ArgMatcher::once(match_singleton),
                ArgMatcher::once(match_expires),
                ArgMatcher::once(match_refs),
            ],
            extender: None,
        }
    }

    /// Property decorator with the default positional shape `(provide, alias)`.
    pub fn property(name: &'static str) -> Self {
        Self {
            name,
            kind: DecoratorKind::Property,
            matchers: vec![
                ArgMatcher::once(match_provide),
                ArgMatcher::once(match_alias),
            ],
            extender: None,
        }
    }

    /// Method decorator accepting a provider list.
    pub fn method(name: &'static str) -> Self {
        Self {
            name,
            kind: DecoratorKind::Method,
            matchers: vec![ArgMatcher::repeating(match_provider)],
            extender: None,
        }
    }

    /// Parameter decorator with the default positional shape `(provide, alias)`.
    pub fn parameter(name: &'static str) -> Self {
        Self {
            name,
            kind: DecoratorKind::Parameter,
            matchers: vec![
                ArgMatcher::once(match_provide),
                ArgMatcher::once(match_alias),
            ],
            extender: None,
        }
    }

    /// Replaces the positional matcher list.
    pub fn with_matchers(mut self, matchers: Vec<ArgMatcher>) -> Self {
        self.matchers = matchers;
        self
    }

    /// Adds an extender that post-processes every parsed record.
    pub fn with_extender(mut self, extender: fn(&mut Metadata)) -> Self {
        self.extender = Some(extender);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> DecoratorKind {
        self.kind
    }

    /// Normalizes one argument list into a metadata record.
    ///
    /// An empty argument list is a valid bare application and yields a
    /// default record (so the extender still runs); an argument list whose
    /// first position matches nothing yields `None`.
    pub fn parse_args(&self, args: &[DecorArg]) -> Option<Metadata> {
        let mut md = if args.is_empty() {
            Some(Metadata::default())
        } else {
            ArgsIterator::new(args, &self.matchers).parse()
        };
        if let (Some(record), Some(extend)) = (md.as_mut(), self.extender) {
            extend(record);
        }
        md
    }

    /// Applies a class decorator to `T`, recording metadata and the
    /// auto-registration hook that lets `T` be registered on demand as a
    /// dependency of another type.
    ///
    /// # Panics
    ///
    /// Panics when called on a non-class decorator; property, method and
    /// parameter decorators attach through [`Decorator::apply_member`].
    pub fn apply<T: Injectable>(&self, table: &MetadataTable, args: &[DecorArg]) {
        assert!(
            self.kind == DecoratorKind::Class,
            "{} is not a class decorator",
            self.name
        );
        let md = self.parse_args(args);
        table.record(TypeId::of::<T>(), Member::Class, self.name, md);
        table.record_auto(
            TypeId::of::<T>(),
            Arc::new(|container: &crate::container::Container| container.register::<T>()),
        );
    }

    /// Applies a member decorator (property/method/parameter) to `T`.
    ///
    /// The target type only needs to exist; non-instantiable targets are
    /// legal here and simply never produce a factory.
    pub fn apply_member<T: 'static>(&self, table: &MetadataTable, member: Member, args: &[DecorArg]) {
        let md = self.parse_args(args);
        table.record(TypeId::of::<T>(), member, self.name, md);
    }
}

impl std::fmt::Debug for Decorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decorator")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

// ----- Built-in decorators -----

/// `Injectable`: marks a class as registrable, with the default class shape.
pub fn injectable() -> Decorator {
    Decorator::class("Injectable")
}

/// `Singleton`: marks a class singleton. `(provide, alias)` positional shape.
pub fn singleton() -> Decorator {
    Decorator::class("Singleton")
        .with_matchers(vec![
            ArgMatcher::once(match_provide),
            ArgMatcher::once(match_alias),
        ])
        .with_extender(|md| md.singleton = Some(true))
}

/// `AutoWired`: property injection point override.
pub fn auto_wired() -> Decorator {
    Decorator::property("AutoWired")
}

/// `Inject`: property or constructor-parameter token override.
pub fn inject() -> Decorator {
    Decorator::parameter("Inject")
}

/// `Providers`: explicit provider list for a method (or the constructor).
pub fn providers() -> Decorator {
    Decorator::method("Providers")
}

/// `Refs`: binds the class as the provider of a token for a specific target.
pub fn refs() -> Decorator {
    Decorator::class("Refs").with_matchers(vec![
        ArgMatcher::once(match_provide),
        ArgMatcher::once(match_refs),
    ])
}

/// `IocExt`: module-extension class; registrations escalate to parent
/// containers and the setup hook runs at registration time.
pub fn ioc_ext() -> Decorator {
    Decorator::class("IocExt").with_extender(|md| md.singleton = Some(true))
}

/// `Autorun`: runs the class's setup hook at registration time.
pub fn autorun() -> Decorator {
    Decorator::class("Autorun")
}
