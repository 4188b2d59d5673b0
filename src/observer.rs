//! Observation hooks for registration and resolution.

use std::sync::Arc;
use std::time::Duration;

use crate::token::TokenKey;

/// Observer of container activity.
///
/// Attached at pool construction via
/// [`PoolBuilder::observer`](crate::PoolBuilder::observer); every container
/// of the pool reports through the same observer set. All methods default to
/// no-ops, so implementors override only what they need.
pub trait DiObserver: Send + Sync {
    /// A type or token is being registered.
    fn registering(&self, key: &TokenKey) {
        let _ = key;
    }

    /// A resolution is starting.
    fn resolving(&self, key: &TokenKey) {
        let _ = key;
    }

    /// A resolution finished (successfully or not) after `duration`.
    fn resolved(&self, key: &TokenKey, duration: Duration) {
        let _ = (key, duration);
    }
}

/// Fan-out collection over the attached observers.
///
/// Resolution timing is only measured when at least one observer is
/// attached, keeping the unobserved path free of clock reads.
pub struct Observers {
    list: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new(list: Vec<Arc<dyn DiObserver>>) -> Self {
        Self { list }
    }

    pub(crate) fn has_observers(&self) -> bool {
        !self.list.is_empty()
    }

    pub(crate) fn registering(&self, key: &TokenKey) {
        for observer in &self.list {
            observer.registering(key);
        }
    }

    pub(crate) fn resolving(&self, key: &TokenKey) {
        for observer in &self.list {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &TokenKey, duration: Duration) {
        for observer in &self.list {
            observer.resolved(key, duration);
        }
    }
}

/// Observer that logs container activity to stderr.
pub struct LoggingObserver;

impl DiObserver for LoggingObserver {
    fn registering(&self, key: &TokenKey) {
        eprintln!("[ferric-ioc] registering {}", key);
    }

    fn resolving(&self, key: &TokenKey) {
        eprintln!("[ferric-ioc] resolving {}", key);
    }

    fn resolved(&self, key: &TokenKey, duration: Duration) {
        eprintln!("[ferric-ioc] resolved {} in {:?}", key, duration);
    }
}
