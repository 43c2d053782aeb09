//! InMemoryDocumentStore - BTreeMap-backed document store for testing and
//! single-process use.
//!
//! Documents are kept per collection in key order, so snapshots are
//! deterministic. Writes bump a store-wide version that stamps every snapshot.
//!
//! Two delivery modes:
//! - [`Delivery::Immediate`]: listeners run on the writer's thread before the
//!   write call returns.
//! - [`Delivery::Deferred`]: notifications queue up until [`flush`] is called,
//!   and back-to-back changes to one collection coalesce into a single
//!   snapshot, like a real live channel under load.
//!
//! [`flush`]: InMemoryDocumentStore::flush

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use super::{DocumentStore, Snapshot, SnapshotListener, Subscription};
use crate::document::{Fields, StoredDocument};
use crate::error::StoreError;

type SharedListener = Arc<dyn Fn(Result<Snapshot, StoreError>) + Send + Sync>;

/// When snapshot notifications reach listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    #[default]
    Immediate,
    Deferred,
}

#[derive(Default)]
struct Storage {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    version: u64,
}

struct Registration {
    id: u64,
    collection: String,
    active: Arc<AtomicBool>,
    listener: SharedListener,
}

enum Pending {
    Snapshot {
        collection: String,
        only: Option<u64>,
    },
    Failed {
        collection: String,
        error: StoreError,
    },
}

#[derive(Default)]
struct Faults {
    next_write: Option<StoreError>,
    next_subscribe: Option<StoreError>,
}

/// In-memory document store with a live snapshot feed.
///
/// Clone-friendly via Arc; clones share documents, listeners and counters.
///
/// ## Example
///
/// ```
/// use stockroom::{DocumentStore, InMemoryDocumentStore};
///
/// let store = InMemoryDocumentStore::new();
/// store.create("equipment", "A1", serde_json::Map::new()).unwrap();
/// assert!(store.create("equipment", "A1", serde_json::Map::new()).is_err());
/// assert_eq!(store.write_count(), 2);
/// ```
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    storage: Arc<RwLock<Storage>>,
    listeners: Arc<Mutex<Vec<Registration>>>,
    pending: Arc<Mutex<Vec<Pending>>>,
    faults: Arc<Mutex<Faults>>,
    writes: Arc<AtomicUsize>,
    next_listener: Arc<AtomicU64>,
    delivery: Delivery,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Create an empty store that notifies listeners immediately.
    pub fn new() -> Self {
        Self::with_delivery(Delivery::Immediate)
    }

    /// Create an empty store whose notifications wait for [`flush`](Self::flush).
    pub fn deferred() -> Self {
        Self::with_delivery(Delivery::Deferred)
    }

    pub fn with_delivery(delivery: Delivery) -> Self {
        Self {
            storage: Arc::new(RwLock::new(Storage::default())),
            listeners: Arc::new(Mutex::new(Vec::new())),
            pending: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Mutex::new(Faults::default())),
            writes: Arc::new(AtomicUsize::new(0)),
            next_listener: Arc::new(AtomicU64::new(1)),
            delivery,
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Number of create/update/delete calls received, including failed ones.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current store version (number of successful writes).
    pub fn version(&self) -> u64 {
        self.storage
            .read()
            .map(|storage| storage.version)
            .unwrap_or_else(|poisoned| poisoned.into_inner().version)
    }

    /// Make the next create/update/delete fail with `error`.
    pub fn fail_next_write(&self, error: StoreError) {
        lock(&self.faults).next_write = Some(error);
    }

    /// Make the next `subscribe` call fail with `error`.
    pub fn fail_next_subscribe(&self, error: StoreError) {
        lock(&self.faults).next_subscribe = Some(error);
    }

    /// Report a channel failure to every subscriber of `collection`.
    pub fn push_error(&self, collection: &str, error: StoreError) {
        match self.delivery {
            Delivery::Immediate => self.deliver_error(collection, &error),
            Delivery::Deferred => lock(&self.pending).push(Pending::Failed {
                collection: collection.to_string(),
                error,
            }),
        }
    }

    /// Number of active subscriptions on `collection`.
    pub fn listener_count(&self, collection: &str) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|r| r.collection == collection && r.active.load(Ordering::SeqCst))
            .count()
    }

    /// Number of notifications waiting for `flush`.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Deliver queued notifications. Consecutive snapshot notifications for
    /// the same collection collapse into one delivery of the latest state.
    ///
    /// Returns the number of deliveries made.
    pub fn flush(&self) -> usize {
        let queued: Vec<Pending> = lock(&self.pending).drain(..).collect();
        let mut delivered = 0;
        let mut previous: Option<(String, Option<u64>)> = None;

        for item in queued {
            match item {
                Pending::Snapshot { collection, only } => {
                    let key = (collection, only);
                    if previous.as_ref() == Some(&key) {
                        continue;
                    }
                    self.deliver_snapshot(&key.0, key.1);
                    previous = Some(key);
                }
                Pending::Failed { collection, error } => {
                    self.deliver_error(&collection, &error);
                    previous = None;
                }
            }
            delivered += 1;
        }

        delivered
    }

    /// Get a document body by key.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    /// Current snapshot of a collection.
    pub fn snapshot(&self, collection: &str) -> Result<Snapshot, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot"))?;
        let documents = storage
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| StoredDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Snapshot {
            version: storage.version,
            documents,
        })
    }

    fn write(
        &self,
        collection: &str,
        operation: &'static str,
        apply: impl FnOnce(&mut BTreeMap<String, Fields>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = lock(&self.faults).next_write.take() {
            return Err(error);
        }

        {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| StoreError::LockPoisoned(operation))?;
            let docs = storage
                .collections
                .entry(collection.to_string())
                .or_default();
            apply(docs)?;
            storage.version += 1;
        }

        self.notify(collection, None);
        Ok(())
    }

    fn notify(&self, collection: &str, only: Option<u64>) {
        match self.delivery {
            Delivery::Immediate => self.deliver_snapshot(collection, only),
            Delivery::Deferred => lock(&self.pending).push(Pending::Snapshot {
                collection: collection.to_string(),
                only,
            }),
        }
    }

    fn deliver_snapshot(&self, collection: &str, only: Option<u64>) {
        let snapshot = match self.snapshot(collection) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(collection, "snapshot unavailable: {error}");
                return self.deliver_error(collection, &error);
            }
        };

        for (active, listener) in self.targets(collection, only) {
            if active.load(Ordering::SeqCst) {
                listener(Ok(snapshot.clone()));
            }
        }
    }

    fn deliver_error(&self, collection: &str, error: &StoreError) {
        for (active, listener) in self.targets(collection, None) {
            if active.load(Ordering::SeqCst) {
                listener(Err(error.clone()));
            }
        }
    }

    /// Collect listeners so none run while the registry is locked.
    fn targets(&self, collection: &str, only: Option<u64>) -> Vec<(Arc<AtomicBool>, SharedListener)> {
        lock(&self.listeners)
            .iter()
            .filter(|r| r.collection == collection && only.map_or(true, |id| r.id == id))
            .map(|r| (r.active.clone(), r.listener.clone()))
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DocumentStore for InMemoryDocumentStore {
    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Result<Subscription, StoreError> {
        if let Some(error) = lock(&self.faults).next_subscribe.take() {
            return Err(error);
        }

        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        let active = Arc::new(AtomicBool::new(true));
        lock(&self.listeners).push(Registration {
            id,
            collection: collection.to_string(),
            active: active.clone(),
            listener: Arc::from(listener),
        });
        tracing::debug!(collection, listener = id, "subscription acquired");

        let listeners = Arc::clone(&self.listeners);
        let subscription = Subscription::new(active, move || {
            lock(&listeners).retain(|r| r.id != id);
        });

        self.notify(collection, Some(id));
        Ok(subscription)
    }

    fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.write(collection, "create", |docs| {
            if docs.contains_key(id) {
                return Err(StoreError::AlreadyExists {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            docs.insert(id.to_string(), fields);
            Ok(())
        })
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.write(collection, "update", |docs| match docs.get_mut(id) {
            Some(existing) => {
                *existing = fields;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.write(collection, "delete", |docs| match docs.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        })
    }
}
