//! Time-bounded cache for a single value.

use std::time::{Duration, Instant};

/// Holds one value until it is older than `ttl` or explicitly invalidated.
///
/// Only successful fetches should be inserted; an empty cache always means
/// "fetch again".
#[derive(Debug)]
pub struct TtlCache<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
        }
    }

    /// The cached value, if present and not expired.
    pub fn get(&self) -> Option<&T> {
        if self.is_fresh() {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// Store a freshly fetched value.
    pub fn insert(&mut self, value: T) {
        self.value = Some(value);
        self.fetched_at = Some(Instant::now());
    }

    /// Drop the cached value so the next read refetches.
    pub fn invalidate(&mut self) {
        self.value = None;
        self.fetched_at = None;
    }

    /// Check if a value is present and younger than the TTL.
    pub fn is_fresh(&self) -> bool {
        match self.fetched_at {
            None => false,
            Some(fetched_at) => fetched_at.elapsed() <= self.ttl,
        }
    }

    /// When the current value was fetched.
    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
