//! Token identity types for registration and lookup.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Identity used to look up a registration.
///
/// Tokens come in three base shapes plus one composite:
///
/// - **Type**: a concrete Rust type used as its own identity (and default
///   factory when the type is registered through [`Injectable`](crate::Injectable))
/// - **Str**: an opaque string identifier
/// - **Symbol**: an opaque identifier unique per [`Token::symbol`] call
/// - **Registration**: a qualified identity of base token plus string
///   discriminator, used to register several named variants of one interface
///
/// Two independently constructed tokens are equal when their canonical
/// [`TokenKey`]s are equal; every container map is keyed by that canonical
/// form, so equal tokens always collide to the same storage slot.
///
/// # Examples
///
/// ```rust
/// use ferric_ioc::{Token, Registration};
///
/// struct Compiler;
///
/// let plain = Token::of::<Compiler>();
/// let ts = Token::of::<Compiler>().with_alias("ts");
/// let dest = Token::Registration(Registration::new(Token::of::<Compiler>(), "dest"));
///
/// assert_eq!(plain, Token::of::<Compiler>());
/// assert_ne!(ts.key(), dest.key());
/// assert_eq!(ts.key(), Token::of::<Compiler>().key_with(Some("ts")));
/// ```
#[derive(Debug, Clone)]
pub enum Token {
    /// Class token: TypeId plus type name for diagnostics
    Type(TypeId, &'static str),
    /// Opaque string identifier
    Str(Cow<'static, str>),
    /// Opaque symbol identifier: unique id plus debug label
    Symbol(u64, &'static str),
    /// Qualified registration: base token plus discriminator
    Registration(Registration),
}

impl Token {
    /// Class token for `T`.
    pub fn of<T: 'static>() -> Token {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// String token.
    pub fn string(s: impl Into<Cow<'static, str>>) -> Token {
        Token::Str(s.into())
    }

    /// Fresh symbol token. Every call produces a distinct identity; the label
    /// is for diagnostics only.
    pub fn symbol(label: &'static str) -> Token {
        Token::Symbol(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed), label)
    }

    /// Wraps this token into a qualified [`Registration`] with the given
    /// discriminator.
    pub fn with_alias(self, alias: impl Into<Cow<'static, str>>) -> Token {
        Token::Registration(Registration::new(self, alias))
    }

    /// Canonical storage key for this token.
    pub fn key(&self) -> TokenKey {
        match self {
            Token::Type(id, name) => TokenKey::Type(*id, name),
            Token::Str(s) => TokenKey::Str(s.clone()),
            Token::Symbol(id, name) => TokenKey::Symbol(*id, name),
            Token::Registration(r) => r.key(),
        }
    }

    /// Canonical key, qualified by `alias` when one is given.
    ///
    /// This is the single key-derivation rule used everywhere: an alias
    /// synthesizes the same key an equivalent [`Registration`] would produce.
    pub fn key_with(&self, alias: Option<&str>) -> TokenKey {
        match alias {
            Some(a) => TokenKey::Aliased(Box::new(self.key()), Cow::Owned(a.to_string())),
            None => self.key(),
        }
    }

    /// TypeId and type name when this is (or wraps) a class token.
    pub fn type_info(&self) -> Option<(TypeId, &'static str)> {
        match self {
            Token::Type(id, name) => Some((*id, name)),
            Token::Registration(r) => r.base.type_info(),
            _ => None,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A (base token, discriminator) pair acting as one token identity.
///
/// Two `Registration`s are equal iff base token and discriminator are equal;
/// their canonical form is `"<base> <discriminator>"`.
#[derive(Debug, Clone)]
pub struct Registration {
    base: Box<Token>,
    discriminator: Cow<'static, str>,
}

impl Registration {
    pub fn new(base: Token, discriminator: impl Into<Cow<'static, str>>) -> Self {
        Self {
            base: Box::new(base),
            discriminator: discriminator.into(),
        }
    }

    /// Qualified registration of class `T` under `discriminator`.
    pub fn of<T: 'static>(discriminator: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Token::of::<T>(), discriminator)
    }

    pub fn base(&self) -> &Token {
        &self.base
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Canonical storage key: the base key qualified by the discriminator.
    pub fn key(&self) -> TokenKey {
        TokenKey::Aliased(Box::new(self.base.key()), self.discriminator.clone())
    }
}

impl PartialEq for Registration {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Registration {}

/// Canonical storage key derived from a [`Token`].
///
/// All container maps (bindings, singleton cache, TTL cache, `has` checks)
/// are keyed by this type. Keys carry the human-readable type name purely for
/// diagnostics; equality and hashing for type-backed variants compare the
/// `TypeId` only.
#[derive(Debug, Clone)]
pub enum TokenKey {
    /// Concrete type key
    Type(TypeId, &'static str),
    /// String token key
    Str(Cow<'static, str>),
    /// Symbol token key
    Symbol(u64, &'static str),
    /// Qualified key: base key plus discriminator
    Aliased(Box<TokenKey>, Cow<'static, str>),
    /// Target-private provider map slot for a requesting type
    PrivateOf(TypeId, &'static str),
    /// Provider of `base` bound specifically to a target type
    TargetRef(Box<TokenKey>, TypeId, &'static str),
}

impl TokenKey {
    /// Human-readable form for diagnostics and error messages.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

// Equality ignores the diagnostic strings for TypeId-backed variants.
impl PartialEq for TokenKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TokenKey::Type(a, _), TokenKey::Type(b, _)) => a == b,
            (TokenKey::Str(a), TokenKey::Str(b)) => a == b,
            (TokenKey::Symbol(a, _), TokenKey::Symbol(b, _)) => a == b,
            (TokenKey::Aliased(a, x), TokenKey::Aliased(b, y)) => a == b && x == y,
            (TokenKey::PrivateOf(a, _), TokenKey::PrivateOf(b, _)) => a == b,
            (TokenKey::TargetRef(a, t, _), TokenKey::TargetRef(b, u, _)) => a == b && t == u,
            _ => false,
        }
    }
}

impl Eq for TokenKey {}

impl std::hash::Hash for TokenKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            TokenKey::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            TokenKey::Str(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            TokenKey::Symbol(id, _) => {
                2u8.hash(state);
                id.hash(state);
            }
            TokenKey::Aliased(base, alias) => {
                3u8.hash(state);
                base.hash(state);
                alias.hash(state);
            }
            TokenKey::PrivateOf(id, _) => {
                4u8.hash(state);
                id.hash(state);
            }
            TokenKey::TargetRef(base, id, _) => {
                5u8.hash(state);
                base.hash(state);
                id.hash(state);
            }
        }
    }
}

// The Aliased arm is the canonical "<base> <discriminator>" form.
impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKey::Type(_, name) => write!(f, "{}", name),
            TokenKey::Str(s) => write!(f, "{}", s),
            TokenKey::Symbol(id, name) => write!(f, "symbol({}#{})", name, id),
            TokenKey::Aliased(base, alias) => write!(f, "{} {}", base, alias),
            TokenKey::PrivateOf(_, name) => write!(f, "private({})", name),
            TokenKey::TargetRef(base, _, name) => write!(f, "{} ref:{}", base, name),
        }
    }
}

/// Helper for creating type keys.
#[inline]
pub fn token_key_of<T: 'static>() -> TokenKey {
    TokenKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}
