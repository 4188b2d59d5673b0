//! Circular dependency detection.
//!
//! Resolution keeps a per-thread in-flight stack of (container, token) pairs.
//! Re-entering a pair that is already being resolved means the constructor
//! chain loops, and the resolution fails fast with the full path instead of
//! recursing until stack exhaustion. Parent delegation re-enters the same
//! token under a different container, which is why the container identity is
//! part of the frame.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

thread_local! {
    static IN_FLIGHT: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Frame guard; pops its entry when the resolution unwinds.
pub(crate) struct StackGuard;

impl Drop for StackGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|tls| {
            tls.borrow_mut().pop();
        });
    }
}

/// Pushes a resolution frame, failing when the same (container, token) pair
/// is already in flight or the stack is implausibly deep.
pub(crate) fn enter(container: usize, name: &str) -> DiResult<StackGuard> {
    IN_FLIGHT.with(|tls| {
        let mut stack = tls.borrow_mut();

        if stack.iter().any(|(c, n)| *c == container && n == name) {
            let mut path: Vec<String> = stack.iter().map(|(_, n)| n.clone()).collect();
            path.push(name.to_string());
            return Err(DiError::Circular(path));
        }
        if stack.len() >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(stack.len()));
        }

        stack.push((container, name.to_string()));
        Ok(StackGuard)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_entry_reports_full_path() {
        let g1 = enter(1, "A").unwrap();
        let g2 = enter(1, "B").unwrap();
        match enter(1, "A") {
            Err(DiError::Circular(path)) => {
                assert_eq!(path, vec!["A".to_string(), "B".to_string(), "A".to_string()]);
            }
            other => panic!("expected circular error, got {:?}", other.map(|_| ())),
        }
        drop(g2);
        drop(g1);
    }

    #[test]
    fn same_token_different_container_is_not_circular() {
        let g1 = enter(1, "A").unwrap();
        let g2 = enter(2, "A");
        assert!(g2.is_ok());
        drop(g2);
        drop(g1);
    }
}
