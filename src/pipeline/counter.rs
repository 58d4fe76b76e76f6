//! The global comment counter, as an explicit dependency.
//!
//! The counter is owned by whoever wires the pipeline (the process entry
//! point) and injected, so its lifecycle is visible rather than ambient
//! process state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic count of comments posted since process start.
#[derive(Debug, Default)]
pub struct CommentCounter(AtomicU64);

impl CommentCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one posted comment; returns the new total.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
