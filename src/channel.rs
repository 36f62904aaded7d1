//! Polled remote resources with cached reads and subscriber fan-out.
//!
//! A [`PollingChannel`] sits between views and a [`Fetch`] collaborator.
//! Reads go through a shared [`CacheStore`]; misses reach the collaborator and
//! broadcast the outcome to every subscriber. A background timer started with
//! [`PollingChannel::watch`] refreshes one request on a fixed period, skipping
//! the cache, until [`PollingChannel::stop`] is called or the channel is
//! dropped.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::{ArcStr, cache::CacheStore, log::Log};

mod core;
mod data;
mod fetch;
#[cfg(test)]
mod tests;

pub use data::{Event, FetchOptions, Listener, Records};
use data::Subscribers;
pub use fetch::{Fetch, FetchFn, fetch_fn};

/// Default period of the background refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const SCOPE: &str = "channel";

/// A deduplicating, periodically refreshed view over one remote collaborator.
///
/// Cloning yields another handle to the same channel: subscribers, timer and
/// cache are shared. Dropping the last handle stops the timer.
///
/// # Examples
/// ```ignore
/// let channel = PollingChannel::new(api.records::<NotificationItem>(), cache, period, log);
/// let subscription = channel.subscribe(|event| {
///     if let Event::Update(items) = event {
///         println!("{} notifications", items.len());
///     }
///     Ok(())
/// });
/// channel.watch("notifications", FetchOptions::new());
/// let items = channel.fetch("notifications", FetchOptions::new()).await;
/// ```
pub struct PollingChannel<F: Fetch> {
    inner: Arc<Inner<F>>,
}

impl<F: Fetch> Clone for PollingChannel<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) struct Inner<F: Fetch> {
    fetcher: F,
    cache: CacheStore<Records<F::Record>>,
    refresh_interval: Duration,
    log: Log,
    subscribers: Arc<Subscribers<F::Record>>,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

impl<F: Fetch> Drop for Inner<F> {
    fn drop(&mut self) {
        let refresher = self
            .refresher
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = refresher.take() {
            handle.abort();
        }
    }
}

impl<F: Fetch> PollingChannel<F> {
    /// Creates an idle channel. No timer runs until [`watch`](Self::watch).
    ///
    /// # Arguments
    /// * `fetcher` - The remote collaborator
    /// * `cache` - Store for fetched records; may be shared with other channels
    /// * `refresh_interval` - Period of the background refresh
    /// * `log` - Where listener and fetch failures are reported
    pub fn new(
        fetcher: F,
        cache: CacheStore<Records<F::Record>>,
        refresh_interval: Duration,
        log: Log,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                cache,
                refresh_interval,
                log,
                subscribers: Arc::new(Subscribers::new()),
                refresher: Mutex::new(None),
            }),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.inner.refresh_interval
    }

    /// Returns the records for `endpoint` with `options`.
    ///
    /// A live cache entry is returned without reaching the collaborator and
    /// without notifying anyone. Otherwise the collaborator is called: on
    /// success the records are cached and broadcast as [`Event::Update`]; on
    /// failure nothing is cached, an [`Event::Error`] is broadcast and an
    /// empty sequence is returned.
    pub async fn fetch(&self, endpoint: impl Into<ArcStr>, options: FetchOptions) -> Records<F::Record> {
        self.inner.fetch(endpoint.into(), options).await
    }

    /// Like [`fetch`](Self::fetch) but always reaches the collaborator.
    pub async fn refresh(&self, endpoint: impl Into<ArcStr>, options: FetchOptions) -> Records<F::Record> {
        self.inner.refresh(endpoint.into(), options).await
    }

    /// Registers `listener`. It is called synchronously, in registration
    /// order, for every event broadcast after this call. The same closure
    /// subscribed twice is called twice.
    pub fn subscribe<L>(&self, listener: L) -> Subscription<F::Record>
    where
        L: Fn(&Event<F::Record>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.subscribers.add(Arc::new(listener));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.inner.subscribers),
        }
    }

    /// Delivers `event` to every current subscriber. A failing or panicking
    /// listener is logged and skipped.
    pub fn notify(&self, event: &Event<F::Record>) {
        self.inner.notify(event);
    }

    /// Drops every cached entry. Subscribers and the timer are untouched.
    pub fn clear(&self) {
        self.inner.cache.clear();
    }

    /// Starts refreshing `endpoint` with `options` every refresh interval,
    /// the first tick one interval from now. A running timer is replaced; a
    /// refresh it already started still completes.
    ///
    /// Must be called within a Tokio runtime. A zero interval disables the
    /// timer.
    pub fn watch(&self, endpoint: impl Into<ArcStr>, options: FetchOptions) {
        let endpoint = endpoint.into();
        let period = self.inner.refresh_interval;
        if period.is_zero() {
            self.inner
                .log
                .warn(SCOPE, format!("Refresh of {} disabled: zero interval", endpoint));
            return;
        }

        let handle = core::Refresher::new(Arc::downgrade(&self.inner), endpoint, options, period).spawn();
        let previous = self
            .inner
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stops the background refresh. No further ticks fire, but a refresh
    /// already under way completes and still updates the cache and
    /// subscribers.
    ///
    /// # Returns
    /// Whether a timer was running.
    pub fn stop(&self) -> bool {
        let handle = self
            .inner
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                running
            }
            None => false,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.inner
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<F: Fetch> Inner<F> {
    async fn fetch(&self, endpoint: ArcStr, options: FetchOptions) -> Records<F::Record> {
        let key = options.cache_key(&endpoint);
        if let Some(records) = self.cache.get(&key) {
            self.log.info(SCOPE, format!("Cache hit for {}", key));
            return records;
        }
        self.load(endpoint, options, key).await
    }

    async fn refresh(&self, endpoint: ArcStr, options: FetchOptions) -> Records<F::Record> {
        let key = options.cache_key(&endpoint);
        self.load(endpoint, options, key).await
    }

    async fn load(&self, endpoint: ArcStr, options: FetchOptions, key: ArcStr) -> Records<F::Record> {
        match self.fetcher.fetch(endpoint.clone(), options).await {
            Ok(records) => {
                let records: Records<F::Record> = records.into();
                self.log
                    .info(SCOPE, format!("Fetched {} records from {}", records.len(), endpoint));
                self.cache.set(key, records.clone());
                self.notify(&Event::Update(records.clone()));
                records
            }
            Err(error) => {
                self.log
                    .warn(SCOPE, format!("Fetching {} failed: {}", endpoint, error));
                self.notify(&Event::Error(error));
                Vec::<F::Record>::new().into()
            }
        }
    }

    fn notify(&self, event: &Event<F::Record>) {
        for listener in self.subscribers.snapshot() {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => self.log.warn(SCOPE, format!("Listener failed: {:#}", error)),
                Err(_) => self.log.error(SCOPE, "Listener panicked"),
            }
        }
    }
}

/// Handle returned by [`PollingChannel::subscribe`].
///
/// Dropping it leaves the listener registered; only
/// [`unsubscribe`](Self::unsubscribe) removes it.
#[must_use = "dropping a subscription keeps the listener registered"]
pub struct Subscription<R> {
    id: u64,
    subscribers: Weak<Subscribers<R>>,
}

impl<R> Subscription<R> {
    /// Removes the listener. Returns `false` if the channel is gone.
    pub fn unsubscribe(self) -> bool {
        self.subscribers
            .upgrade()
            .is_some_and(|subscribers| subscribers.remove(self.id))
    }
}
