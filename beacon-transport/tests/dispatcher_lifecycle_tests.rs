// Lifecycle tests for the async delivery path: single-worker guarantee under
// concurrent dispatch, disposal-then-reacquire after channel failure, and the
// real HTTP worker draining its channel end to end.

use beacon_transport::{Dispatcher, HttpSender, HttpWorkerFactory, WorkerFactory};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct CountingFactory {
    spawned: AtomicUsize,
    receivers: Mutex<Vec<UnboundedReceiver<String>>>,
}

impl fmt::Debug for CountingFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingFactory")
            .field("spawned", &self.spawned)
            .finish()
    }
}

impl CountingFactory {
    fn new() -> Arc<Self> {
        Arc::new(CountingFactory {
            spawned: AtomicUsize::new(0),
            receivers: Mutex::new(Vec::new()),
        })
    }

    fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    fn drop_live_receivers(&self) {
        self.receivers.lock().unwrap().clear();
    }

    fn received_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for rx in self.receivers.lock().unwrap().iter_mut() {
            while let Ok(line) = rx.try_recv() {
                lines.push(line);
            }
        }
        lines
    }
}

impl WorkerFactory for CountingFactory {
    fn spawn(&self) -> UnboundedSender<String> {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.receivers.lock().unwrap().push(rx);
        tx
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("beacon_transport=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_dispatch_spawns_exactly_one_worker() {
    init_tracing();
    let factory = CountingFactory::new();
    let dispatcher = Arc::new(Dispatcher::new(factory.clone()));

    let mut tasks = Vec::new();
    for i in 0..64 {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            dispatcher.dispatch(&format!("http://collector.local/track/?data={}", i));
        }));
    }
    futures::future::join_all(tasks).await;

    assert_eq!(factory.spawn_count(), 1);
    assert_eq!(factory.received_lines().len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn disposal_under_contention_recreates_at_most_one_worker() {
    init_tracing();
    let factory = CountingFactory::new();
    let dispatcher = Arc::new(Dispatcher::new(factory.clone()));

    // Warm up, then kill the worker's receiving end mid-flight.
    dispatcher.dispatch("http://collector.local/track/?data=warmup");
    assert_eq!(factory.spawn_count(), 1);
    factory.drop_live_receivers();

    let mut tasks = Vec::new();
    for i in 0..64 {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            dispatcher.dispatch(&format!("http://collector.local/track/?data={}", i));
        }));
    }
    futures::future::join_all(tasks).await;

    // Every write against the dead worker fails silently; the slot is cleared
    // once and refilled at most once, never two live handles at a time. The
    // refill may not have happened yet if every task raced ahead of the first
    // disposal, so the count here is 1 or 2, never more.
    let count = factory.spawn_count();
    assert!((1..=2).contains(&count), "spawned {} workers", count);

    // The replacement worker is live and accepts subsequent events.
    dispatcher.dispatch("http://collector.local/track/?data=after");
    assert_eq!(factory.spawn_count(), 2);
    dispatcher.dispatch("http://collector.local/track/?data=again");
    assert_eq!(factory.spawn_count(), 2);
    assert!(factory
        .received_lines()
        .iter()
        .any(|line| line == "http://collector.local/track/?data=after\n"));
}

#[tokio::test]
async fn http_worker_drains_channel_and_delivers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", mockito::Matcher::Regex(r"^/track/.*".to_string()))
        .with_body("1")
        .expect(3)
        .create_async()
        .await;

    let sender = Arc::new(HttpSender::new(Duration::from_secs(2)).unwrap());
    let factory = Arc::new(HttpWorkerFactory::new(sender));
    let dispatcher = Dispatcher::new(factory);

    for i in 0..3 {
        dispatcher.dispatch(&format!("{}/track/?data=e{}", server.url(), i));
    }

    // The worker delivers in the background; poll the mock until it has seen
    // all three requests.
    for _ in 0..50 {
        if mock.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    mock.assert_async().await;
}
