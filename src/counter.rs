//! # Visitor Counter Module
//!
//! Process-local visitor counter backing the counter endpoints. State lives
//! in memory only and resets on restart.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic visitor counter, starting at 1
pub struct VisitorCounter {
    count: AtomicU64,
}

impl VisitorCounter {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(1),
        }
    }

    /// Current value without changing it.
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Bump the counter and return the new value.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for VisitorCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_one() {
        let counter = VisitorCounter::new();
        assert_eq!(counter.current(), 1);
    }

    #[test]
    fn test_increment_returns_new_value() {
        let counter = VisitorCounter::new();
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.increment(), 3);
        assert_eq!(counter.current(), 3);
    }

    #[test]
    fn test_current_does_not_advance() {
        let counter = VisitorCounter::new();
        counter.current();
        counter.current();
        assert_eq!(counter.current(), 1);
    }
}
