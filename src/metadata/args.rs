//! Positional decorator-argument parsing.

use super::{DecorArg, Metadata};

/// One positional match predicate.
///
/// `apply` returns `true` when the argument matched and was written into the
/// record. Non-`repeat` matchers are consumed once a position matches them,
/// so later positions continue with the next predicate; `repeat` matchers
/// (provider lists) keep matching subsequent positions.
#[derive(Clone, Copy)]
pub struct ArgMatcher {
    pub apply: fn(&DecorArg, &mut Metadata) -> bool,
    pub repeat: bool,
}

impl ArgMatcher {
    pub const fn once(apply: fn(&DecorArg, &mut Metadata) -> bool) -> Self {
        Self {
            apply,
            repeat: false,
        }
    }

    pub const fn repeating(apply: fn(&DecorArg, &mut Metadata) -> bool) -> Self {
        Self {
            apply,
            repeat: true,
        }
    }
}

/// Positional argument cursor.
///
/// Arguments are processed in order. At each position the remaining matchers
/// are tried in order and the first that matches is applied; a position that
/// matches no remaining predicate freezes the iterator (remaining arguments
/// are ignored). A full metadata-object argument short-circuits everything
/// else: it is shallow-merged into the accumulator and parsing stops.
///
/// Returns `None` when nothing was accumulated at all; the decorator
/// application is then a data no-op, though the target still counts as
/// decorated.
pub struct ArgsIterator<'a> {
    args: &'a [DecorArg],
    matchers: &'a [ArgMatcher],
}

impl<'a> ArgsIterator<'a> {
    pub fn new(args: &'a [DecorArg], matchers: &'a [ArgMatcher]) -> Self {
        Self { args, matchers }
    }

    pub fn parse(self) -> Option<Metadata> {
        let mut acc: Option<Metadata> = None;
        let mut next_matcher = 0usize;

        for arg in self.args {
            if let DecorArg::Metadata(md) = arg {
                acc.get_or_insert_with(Metadata::default).merge(md);
                break;
            }

            let mut matched = false;
            let mut scan = next_matcher;
            while scan < self.matchers.len() {
                let m = &self.matchers[scan];
                let record = acc.get_or_insert_with(Metadata::default);
                if (m.apply)(arg, record) {
                    matched = true;
                    if !m.repeat {
                        next_matcher = scan + 1;
                    } else {
                        next_matcher = scan;
                    }
                    break;
                }
                scan += 1;
            }

            if !matched {
                // Freeze: this position fits no remaining predicate.
                break;
            }
        }

        // Drop the record again if every position failed to contribute.
        match acc {
            Some(md) if is_empty(&md) && !self.args.is_empty() => None,
            other => other,
        }
    }
}

fn is_empty(md: &Metadata) -> bool {
    md.provide.is_none()
        && md.alias.is_none()
        && md.singleton.is_none()
        && md.expires.is_none()
        && md.refs.is_none()
        && md.providers.is_empty()
}

// Standard field matchers, shared by the built-in decorator shapes.

pub(crate) fn match_provide(arg: &DecorArg, md: &mut Metadata) -> bool {
    if let DecorArg::Token(t) = arg {
        md.provide = Some(t.clone());
        true
    } else {
        false
    }
}

pub(crate) fn match_alias(arg: &DecorArg, md: &mut Metadata) -> bool {
    if let DecorArg::Str(s) = arg {
        md.alias = Some(s.clone());
        true
    } else {
        false
    }
}

pub(crate) fn match_singleton(arg: &DecorArg, md: &mut Metadata) -> bool {
    if let DecorArg::Bool(b) = arg {
        md.singleton = Some(*b);
        true
    } else {
        false
    }
}

pub(crate) fn match_expires(arg: &DecorArg, md: &mut Metadata) -> bool {
    if let DecorArg::Millis(ms) = arg {
        md.expires = Some(std::time::Duration::from_millis(*ms));
        true
    } else {
        false
    }
}

pub(crate) fn match_refs(arg: &DecorArg, md: &mut Metadata) -> bool {
    if let DecorArg::Token(t) = arg {
        md.refs = Some(t.clone());
        true
    } else {
        false
    }
}

pub(crate) fn match_provider(arg: &DecorArg, md: &mut Metadata) -> bool {
    if let DecorArg::Provider(p) = arg {
        md.providers.push(p.clone());
        true
    } else {
        false
    }
}
