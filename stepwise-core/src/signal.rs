//! Completion signal shared between an experiment and the orchestrator
//!
//! A single boolean cell with atomic get/put. The owning experiment is the
//! only writer; the orchestration loop and anything else may read it at any
//! time without blocking.

use portable_atomic::{AtomicBool, Ordering};

/// Single-writer, multi-reader completion flag
#[derive(Debug)]
pub struct CompletionSignal {
    done: AtomicBool,
}

impl CompletionSignal {
    /// Create a signal reading `false`
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Store a new value
    pub fn put(&self, done: bool) {
        self.done.store(done, Ordering::Release);
    }

    /// Read the current value
    pub fn get(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether every signal in a set reads `true`
///
/// An empty set counts as complete.
pub fn all_set<'a, I>(signals: I) -> bool
where
    I: IntoIterator<Item = &'a CompletionSignal>,
{
    signals.into_iter().all(CompletionSignal::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let signal = CompletionSignal::new();
        assert!(!signal.get());

        signal.put(true);
        assert!(signal.get());

        signal.put(false);
        assert!(!signal.get());
    }

    #[test]
    fn test_conjunction() {
        let a = CompletionSignal::new();
        let b = CompletionSignal::new();

        assert!(!all_set([&a, &b]));
        a.put(true);
        assert!(!all_set([&a, &b]));
        b.put(true);
        assert!(all_set([&a, &b]));
    }

    #[test]
    fn test_empty_set_is_complete() {
        assert!(all_set(core::iter::empty()));
    }
}
