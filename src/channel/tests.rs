use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use super::*;
use crate::{log::LogLevel, net::TransportError};

const PERIOD: Duration = Duration::from_secs(60);
const TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: &'static str,
    kind: &'static str,
    read: bool,
}

fn item(id: &'static str, kind: &'static str, read: bool) -> Item {
    Item { id, kind, read }
}

type Script = Arc<Mutex<VecDeque<Result<Vec<Item>, TransportError>>>>;

/// A collaborator answering from a script, repeating the last answer once the
/// script runs out, and counting its calls.
fn scripted(
    answers: Vec<Result<Vec<Item>, TransportError>>,
) -> (impl Fetch<Record = Item>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let script: Script = Arc::new(Mutex::new(answers.into()));
    let counter = calls.clone();
    let fetcher = fetch_fn(move |_endpoint: ArcStr, _options: FetchOptions| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut script = script.lock().unwrap();
        let answer = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
        };
        async move { answer }
    });
    (fetcher, calls)
}

/// A collaborator that takes `delay` to answer each call with one record,
/// counting its calls.
fn slow(delay: Duration) -> (impl Fetch<Record = Item>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetcher = fetch_fn(move |_endpoint: ArcStr, _options: FetchOptions| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(delay).await;
            Ok::<_, TransportError>(vec![item("a", "alert", false)])
        }
    });
    (fetcher, calls)
}

fn recorder() -> (
    Arc<Mutex<Vec<Event<Item>>>>,
    impl Fn(&Event<Item>) -> anyhow::Result<()> + Send + Sync + 'static,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener = move |event: &Event<Item>| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    };
    (events, listener)
}

fn setup<F: Fetch>(fetcher: F) -> (PollingChannel<F>, CacheStore<Records<F::Record>>, Log) {
    let cache = CacheStore::new(TTL);
    let log = Log::mock();
    let channel = PollingChannel::new(fetcher, cache.clone(), PERIOD, log.clone());
    (channel, cache, log)
}

#[tokio::test(start_paused = true)]
async fn test_fetch_within_ttl_reaches_collaborator_once() {
    let (fetcher, calls) = scripted(vec![Ok(vec![item("a", "alert", false)])]);
    let (channel, _, _) = setup(fetcher);
    let (events, listener) = recorder();
    let _subscription = channel.subscribe(listener);

    let first = channel.fetch("notifications", FetchOptions::new()).await;
    let second = channel.fetch("notifications", FetchOptions::new()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(&*first, &[item("a", "alert", false)]);
    assert_eq!(first, second);
    // Only the miss notifies
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_after_ttl_reaches_collaborator_again() {
    let (fetcher, calls) = scripted(vec![Ok(vec![item("a", "info", true)])]);
    let (channel, _, _) = setup(fetcher);

    channel.fetch("notifications", FetchOptions::new()).await;
    tokio::time::advance(TTL).await;
    channel.fetch("notifications", FetchOptions::new()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_options_are_part_of_the_key() {
    let (fetcher, calls) = scripted(vec![Ok(vec![item("a", "info", true)])]);
    let (channel, cache, _) = setup(fetcher);

    channel.fetch("notifications", FetchOptions::new()).await;
    channel
        .fetch("notifications", FetchOptions::new().header("X-Team", "north"))
        .await;
    channel.fetch("clients", FetchOptions::new()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(cache.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_returns_empty_and_notifies_error() {
    let error = TransportError::timeout();
    let (fetcher, calls) = scripted(vec![Err(error.clone())]);
    let (channel, cache, log) = setup(fetcher);
    let (events, listener) = recorder();
    let _subscription = channel.subscribe(listener);

    let records = channel.fetch("notifications", FetchOptions::new()).await;

    assert!(records.is_empty());
    assert_eq!(*events.lock().unwrap(), vec![Event::Error(error)]);
    assert!(cache.is_empty());

    // Nothing was cached, so the next read tries again
    channel.fetch("notifications", FetchOptions::new()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let messages = log.messages().unwrap();
    assert!(
        messages
            .iter()
            .any(|m| m.level == LogLevel::Warning && m.scope == "channel")
    );
}

#[tokio::test(start_paused = true)]
async fn test_failing_listener_does_not_stop_delivery() {
    let (fetcher, _) = scripted(vec![]);
    let (channel, _, log) = setup(fetcher);

    let _failing = channel.subscribe(|_: &Event<Item>| anyhow::bail!("boom"));
    let _panicking = channel.subscribe(|_: &Event<Item>| panic!("listener panic"));
    let (events, listener) = recorder();
    let _recording = channel.subscribe(listener);

    let update = Event::Update(Records::from(vec![item("x", "report", false)]));
    channel.notify(&update);

    assert_eq!(*events.lock().unwrap(), vec![update]);

    let messages = log.messages().unwrap();
    assert!(messages.iter().any(|m| m.message.contains("boom")));
    assert!(messages.iter().any(|m| m.level == LogLevel::Error));
}

#[tokio::test(start_paused = true)]
async fn test_listeners_run_in_registration_order() {
    let (fetcher, _) = scripted(vec![]);
    let (channel, _, _) = setup(fetcher);
    let order = Arc::new(Mutex::new(Vec::new()));

    for n in 0..3 {
        let order = order.clone();
        let _ = channel.subscribe(move |_: &Event<Item>| {
            order.lock().unwrap().push(n);
            Ok(())
        });
    }
    channel.notify(&Event::Update(Records::from(Vec::new())));

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_listener_is_not_called() {
    let (fetcher, _) = scripted(vec![Ok(vec![item("a", "alert", false)])]);
    let (channel, _, _) = setup(fetcher);
    let (events, listener) = recorder();

    let subscription = channel.subscribe(listener);
    assert_eq!(channel.subscriber_count(), 1);
    assert!(subscription.unsubscribe());
    assert_eq!(channel.subscriber_count(), 0);

    channel.fetch("notifications", FetchOptions::new()).await;
    channel.notify(&Event::Error(TransportError::network("down")));
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_after_channel_dropped() {
    let (fetcher, _) = scripted(vec![]);
    let (channel, _, _) = setup(fetcher);
    let subscription = channel.subscribe(|_: &Event<Item>| Ok(()));
    drop(channel);
    assert!(!subscription.unsubscribe());
}

#[tokio::test(start_paused = true)]
async fn test_clear_forces_next_fetch() {
    let (fetcher, calls) = scripted(vec![Ok(vec![item("a", "alert", false)])]);
    let (channel, _, _) = setup(fetcher);
    let (_events, listener) = recorder();
    let _subscription = channel.subscribe(listener);

    channel.fetch("notifications", FetchOptions::new()).await;
    channel.clear();
    channel.fetch("notifications", FetchOptions::new()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(channel.subscriber_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_bypasses_live_cache() {
    let (fetcher, calls) = scripted(vec![Ok(vec![item("a", "alert", false)])]);
    let (channel, _, _) = setup(fetcher);

    channel.fetch("notifications", FetchOptions::new()).await;
    channel.watch("notifications", FetchOptions::new());
    assert!(channel.is_watching());

    // Still well within the TTL when the timer fires
    tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::sleep(PERIOD).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timer_refresh_replaces_cached_value_and_notifies_in_order() {
    let first = vec![item("a", "reminder", false)];
    let second = vec![item("a", "reminder", true), item("b", "alert", false)];
    let (fetcher, _) = scripted(vec![Ok(first.clone()), Ok(second.clone())]);
    let (channel, cache, _) = setup(fetcher);
    let (events, listener) = recorder();
    let _subscription = channel.subscribe(listener);

    channel.watch("notifications", FetchOptions::new());
    channel.fetch("notifications", FetchOptions::new()).await;
    tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
    channel.stop();

    let key = FetchOptions::new().cache_key("notifications");
    assert_eq!(cache.get(&key).as_deref(), Some(second.as_slice()));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            Event::Update(Records::from(first)),
            Event::Update(Records::from(second)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_timer_keeps_polling_without_subscribers() {
    let (fetcher, calls) = scripted(vec![Ok(Vec::new())]);
    let (channel, _, _) = setup(fetcher);

    channel.watch("notifications", FetchOptions::new());
    tokio::time::sleep(PERIOD * 3 + Duration::from_millis(1)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_polling() {
    let (fetcher, calls) = scripted(vec![Ok(Vec::new())]);
    let (channel, _, _) = setup(fetcher);

    assert!(!channel.stop());
    channel.watch("notifications", FetchOptions::new());
    assert!(channel.stop());
    assert!(!channel.is_watching());

    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_watch_replaces_previous_timer() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    let fetcher = fetch_fn(move |endpoint: ArcStr, _options: FetchOptions| {
        seen.lock().unwrap().push(endpoint);
        async { Ok::<_, TransportError>(vec![0u8]) }
    });
    let (channel, _, _) = setup(fetcher);

    channel.watch("notifications", FetchOptions::new());
    channel.watch("manager/report-flags", FetchOptions::new());
    tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;

    assert_eq!(*calls.lock().unwrap(), vec![ArcStr::from("manager/report-flags")]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_lets_running_refresh_finish() {
    let (fetcher, calls) = slow(Duration::from_secs(5));
    let (channel, cache, _) = setup(fetcher);
    let (events, listener) = recorder();
    let _subscription = channel.subscribe(listener);

    channel.watch("notifications", FetchOptions::new());
    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.is_empty());

    assert!(channel.stop());
    tokio::time::sleep(PERIOD * 2).await;

    let key = FetchOptions::new().cache_key("notifications");
    let expected = Records::from(vec![item("a", "alert", false)]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get(&key), Some(expected.clone()));
    assert_eq!(*events.lock().unwrap(), vec![Event::Update(expected)]);
}

#[tokio::test(start_paused = true)]
async fn test_replaced_timer_lets_running_refresh_finish() {
    let (fetcher, calls) = slow(Duration::from_secs(5));
    let (channel, cache, _) = setup(fetcher);

    channel.watch("notifications", FetchOptions::new());
    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
    channel.watch("manager/report-flags", FetchOptions::new());
    tokio::time::sleep(Duration::from_secs(10)).await;
    channel.stop();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let key = FetchOptions::new().cache_key("notifications");
    assert!(cache.get(&key).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_fetch_and_refresh_last_completion_wins() {
    let slow_answer = vec![item("a", "alert", false)];
    let fast_answer = vec![item("a", "alert", true), item("b", "info", false)];
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let (slow_records, fast_records) = (slow_answer.clone(), fast_answer.clone());
    let fetcher = fetch_fn(move |_endpoint: ArcStr, _options: FetchOptions| {
        // The first call is the manual fetch, every later one a timer refresh
        let (delay, answer) = match counter.fetch_add(1, Ordering::SeqCst) {
            0 => (Duration::from_secs(10), slow_records.clone()),
            _ => (Duration::from_secs(1), fast_records.clone()),
        };
        async move {
            tokio::time::sleep(delay).await;
            Ok::<_, TransportError>(answer)
        }
    });
    let (channel, cache, _) = setup(fetcher);
    let (events, listener) = recorder();
    let _subscription = channel.subscribe(listener);
    let key = FetchOptions::new().cache_key("notifications");

    channel.watch("notifications", FetchOptions::new());
    tokio::time::sleep(PERIOD - Duration::from_secs(1)).await;

    // Starts one second before the tick and completes eight seconds after
    // the tick's refresh
    let (fetched, _) = tokio::join!(channel.fetch("notifications", FetchOptions::new()), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get(&key).as_deref(), Some(fast_answer.as_slice()));
    });
    channel.stop();

    assert_eq!(&*fetched, slow_answer.as_slice());
    assert_eq!(cache.get(&key).as_deref(), Some(slow_answer.as_slice()));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            Event::Update(Records::from(fast_answer.clone())),
            Event::Update(Records::from(slow_answer.clone())),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_last_handle_stops_timer() {
    let (fetcher, calls) = scripted(vec![Ok(Vec::new())]);
    let (channel, _, _) = setup(fetcher);

    let other = channel.clone();
    channel.watch("notifications", FetchOptions::new());
    drop(channel);
    tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    drop(other);
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_disables_timer() {
    let (fetcher, _) = scripted(vec![]);
    let log = Log::mock();
    let channel = PollingChannel::new(fetcher, CacheStore::new(TTL), Duration::ZERO, log.clone());

    channel.watch("notifications", FetchOptions::new());
    assert!(!channel.is_watching());
    assert_eq!(log.messages().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_channels_share_a_cache_without_cross_talk() {
    let (notifications, _) = scripted(vec![Ok(vec![item("n", "alert", false)])]);
    let (flags, _) = scripted(vec![Ok(vec![item("f", "report", true)])]);
    let cache = CacheStore::new(TTL);
    let a = PollingChannel::new(notifications, cache.clone(), PERIOD, Log::mock());
    let b = PollingChannel::new(flags, cache.clone(), PERIOD, Log::mock());

    a.fetch("notifications", FetchOptions::new()).await;
    b.fetch("manager/report-flags", FetchOptions::new()).await;
    assert_eq!(cache.len(), 2);

    a.clear();
    assert!(cache.is_empty());
}
