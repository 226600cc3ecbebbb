// src/storage/directory.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::models::server::{Server, ServerListResponse};
use crate::transport::{Transport, SERVER_LIST_PATH};

/// Immutable copy of the server list at one point in time.
pub type Snapshot = Arc<Vec<Server>>;

type Callback = Arc<dyn Fn(Snapshot) + Send + Sync>;
type Subscribers = DashMap<u64, Callback>;

/// Keeps the authoritative server list fresh and fans every successful
/// snapshot out to subscribers.
///
/// Failed refreshes never replace or clear the list; subscribers only ever
/// see "nothing yet" or the last good snapshot.
pub struct ServerDirectoryStore {
    transport: Arc<dyn Transport>,
    refresh_interval: Duration,
    latest: watch::Sender<Option<Snapshot>>,
    last_error: RwLock<Option<FetchError>>,
    last_updated: RwLock<Option<Instant>>,
    subscribers: Arc<Subscribers>,
    next_subscriber: AtomicU64,
    // Serialises replay-on-subscribe against publication so no subscriber
    // sees an older snapshot after a newer one.
    delivery: ReentrantMutex<()>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl ServerDirectoryStore {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::with_interval(transport, config.refresh_interval())
    }

    pub fn with_interval(transport: Arc<dyn Transport>, refresh_interval: Duration) -> Self {
        Self {
            transport,
            refresh_interval,
            latest: watch::channel(None).0,
            last_error: RwLock::new(None),
            last_updated: RwLock::new(None),
            subscribers: Arc::new(DashMap::new()),
            next_subscriber: AtomicU64::new(0),
            delivery: ReentrantMutex::new(()),
            refresh_task: Mutex::new(None),
        }
    }

    /// Latest successful snapshot, or an empty list before the first one.
    pub fn current_list(&self) -> Snapshot {
        self.latest.borrow().clone().unwrap_or_default()
    }

    /// True once at least one fetch has succeeded.
    pub fn has_data(&self) -> bool {
        self.latest.borrow().is_some()
    }

    /// Error of the most recent failed fetch, cleared by the next success.
    /// Lets a UI flag stale data without ever blanking it.
    pub fn last_error(&self) -> Option<FetchError> {
        self.last_error.read().clone()
    }

    pub fn last_updated(&self) -> Option<Instant> {
        *self.last_updated.read()
    }

    /// Registers `on_update`. It is called right away with the current
    /// snapshot if one exists, then with every later successful snapshot
    /// until the returned handle is dropped.
    pub fn subscribe<F>(&self, on_update: F) -> Subscription
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let _delivery = self.delivery.lock();
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let callback: Callback = Arc::new(on_update);
        self.subscribers.insert(id, callback.clone());
        debug!("Subscriber {} registered ({} total)", id, self.subscribers.len());

        let current = self.latest.borrow().clone();
        if let Some(snapshot) = current {
            callback(snapshot);
        }

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Async view of the same replay-latest stream.
    pub fn watch(&self) -> watch::Receiver<Option<Snapshot>> {
        self.latest.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Fetches once, outside the periodic cadence. The timer is left alone.
    ///
    /// The error is returned to the caller for display; the stored list and
    /// subscribers are unaffected by it.
    pub async fn reload(&self) -> Result<Snapshot> {
        match self.fetch().await {
            Ok(servers) => {
                let snapshot: Snapshot = Arc::new(servers);
                info!("Server list refreshed: {} servers", snapshot.len());
                *self.last_error.write() = None;
                *self.last_updated.write() = Some(Instant::now());
                self.publish(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                error!("Failed to fetch server list, keeping last known list: {}", e);
                *self.last_error.write() = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Starts the refresh loop: one fetch now, then one per interval, each
    /// scheduled only after the previous fetch settles.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.refresh_task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            warn!("Server list refresh already running");
            return;
        }

        let store = Arc::downgrade(self);
        let interval = self.refresh_interval;
        info!("Starting server list refresh every {:?}", interval);
        *task = Some(tokio::spawn(refresh_loop(store, interval)));
    }

    /// Stops the refresh loop. No timer-driven fetch happens afterwards.
    pub fn stop(&self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
            info!("Server list refresh stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    async fn fetch(&self) -> Result<Vec<Server>> {
        let payload = self.transport.get_json(SERVER_LIST_PATH).await?;
        let response: ServerListResponse = serde_json::from_value(payload)?;
        if response.status != "ok" {
            return Err(FetchError::BadStatus(response.status));
        }
        Ok(response.data)
    }

    fn publish(&self, snapshot: Snapshot) {
        let _delivery = self.delivery.lock();
        self.latest.send_replace(Some(snapshot.clone()));

        let targets: Vec<(u64, Callback)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        debug!("Delivering snapshot to {} subscribers", targets.len());

        for (id, callback) in targets {
            // A callback may have unsubscribed someone later in the list.
            if self.subscribers.contains_key(&id) {
                callback(snapshot.clone());
            }
        }
    }
}

impl Drop for ServerDirectoryStore {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_loop(store: Weak<ServerDirectoryStore>, interval: Duration) {
    loop {
        let Some(strong) = store.upgrade() else {
            debug!("Server directory dropped, ending refresh loop");
            break;
        };
        // Failures are already logged and recorded by reload.
        let _ = strong.reload().await;
        drop(strong);

        debug!("Next server list refresh in {:?}", interval);
        tokio::time::sleep(interval).await;
    }
}

/// Handle returned by [`ServerDirectoryStore::subscribe`]. Dropping it
/// unsubscribes; in-flight fetches are never cancelled by this.
pub struct Subscription {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.remove(&self.id);
            debug!("Subscriber {} removed", self.id);
        }
    }
}
