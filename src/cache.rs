//! Time-bounded in-memory response cache.
//!
//! A [`CacheStore`] maps string keys to values stamped with the time they were
//! stored. Every entry shares the store's single time-to-live; an entry older
//! than that is purged by the next read that touches it; there is no
//! background sweep.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::time::Instant;

use crate::ArcStr;


/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// A shared key → value cache with a global TTL.
///
/// Cloning yields another handle to the same entries, so one store can back
/// several [`PollingChannel`](crate::channel::PollingChannel)s; their keys are
/// namespaced by endpoint and options and never collide. The store lives as
/// long as its last handle and is never persisted.
///
/// Reads and writes are synchronous and never held across an `.await`.
#[derive(Debug)]
pub struct CacheStore<V> {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<ArcStr, Entry<V>>>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            entries: self.entries.clone(),
        }
    }
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> CacheStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores `value` under `key`, replacing any previous entry and restarting
    /// its lifetime.
    pub fn set(&self, key: impl Into<ArcStr>, value: V) {
        let entry = Entry {
            value,
            stored_at: Instant::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> CacheStore<V> {
    /// Returns the value stored under `key` while it is younger than the TTL.
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }
}
