use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::Serialize;

use crate::{ArcStr, net::TransportError};

/// A fetched sequence of records, shared between the cache, the caller and
/// every subscriber without copying.
pub type Records<R> = Arc<[R]>;

/// What a subscriber is told after a fetch reaches the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<R> {
    /// A fetch succeeded; carries the freshly stored records.
    Update(Records<R>),
    /// A fetch failed; nothing was cached.
    Error(TransportError),
}

/// Per-request options handed to the fetch collaborator.
///
/// Together with the endpoint they identify a logical request: the cache key
/// is the endpoint followed by the canonical JSON form of the options, and
/// header maps are ordered so equal options always serialize alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchOptions {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<ArcStr, ArcStr>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a request header.
    pub fn header(mut self, key: impl Into<ArcStr>, value: impl Into<ArcStr>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// The cache key for a request to `endpoint` with these options, e.g.
    /// `notifications-{}`.
    pub fn cache_key(&self, endpoint: &str) -> ArcStr {
        let options = serde_json::to_string(self).unwrap_or_default();
        ArcStr::from(format!("{}-{}", endpoint, options))
    }
}

/// A registered listener. Returning an error is the listener's way to report
/// a failure; it is logged and does not affect other listeners.
pub type Listener<R> = Arc<dyn Fn(&Event<R>) -> anyhow::Result<()> + Send + Sync>;

/// Listeners of one channel, kept in registration order.
pub(crate) struct Subscribers<R> {
    inner: Mutex<Registry<R>>,
}

struct Registry<R> {
    next_id: u64,
    listeners: Vec<(u64, Listener<R>)>,
}

impl<R> Subscribers<R> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// Registers a listener and returns the id used to remove it.
    pub fn add(&self, listener: Listener<R>) -> u64 {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, listener));
        id
    }

    /// Removes the listener registered under `id`; `false` if it was already gone.
    pub fn remove(&self, id: u64) -> bool {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.listeners.len();
        registry.listeners.retain(|(other, _)| *other != id);
        registry.listeners.len() != before
    }

    /// The current listeners. Notification iterates this copy so a listener
    /// may subscribe or unsubscribe while being called.
    pub fn snapshot(&self) -> Vec<Listener<R>> {
        let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}
