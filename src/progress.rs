//! Progress reporting for long-running archive jobs.
//!
//! The core is single-threaded per archive (see the crate's concurrency
//! model); the only state meant to be touched from another thread while a
//! job runs is this counter. Updates use relaxed ordering: the counter is
//! purely observational and never gates other memory.

use std::sync::atomic::{AtomicU64,Ordering};

/// A monotonically increasing count of input bytes consumed so far.
pub struct ProgressCounter(AtomicU64);

impl ProgressCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }
    pub fn add(&self,n: u64) {
        self.0.fetch_add(n,Ordering::Relaxed);
    }
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
    /// Percentage of `total` processed so far, 0 if `total` is 0.
    pub fn percent(&self,total: u64) -> u64 {
        if total == 0 { 0 } else { (self.get() * 100) / total }
    }
}

impl Default for ProgressCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_zero_with_no_total() {
        let p = ProgressCounter::new();
        p.add(10);
        assert_eq!(p.percent(0),0);
    }

    #[test]
    fn percent_tracks_progress() {
        let p = ProgressCounter::new();
        p.add(25);
        assert_eq!(p.percent(100),25);
        p.add(75);
        assert_eq!(p.percent(100),100);
    }
}
