//! Live collection mirror - the local copy of the remote record collection.
//!
//! The mirror has exactly one inbound path: [`MirrorMessage`], applied from the
//! subscription listener. A snapshot replaces the whole record set; nothing
//! patches it incrementally and nothing outside the listener can write it.
//! Readers get a [`Mirror`] handle, which is read-only.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::error::{StoreError, SubscriptionError};
use crate::record::Record;
use crate::store::{DocumentStore, DocumentsExt, Subscription};

/// Loading/error state of the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MirrorStatus {
    /// No snapshot or error has arrived yet.
    #[default]
    Loading,
    Ready,
    /// The last delivery was an error. Records from the last good snapshot
    /// are still served.
    Failed(SubscriptionError),
}

impl MirrorStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, MirrorStatus::Loading)
    }

    pub fn error(&self) -> Option<&SubscriptionError> {
        match self {
            MirrorStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// The only messages that change a mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorMessage {
    /// A complete snapshot at `version`.
    Replace { version: u64, records: Vec<Record> },
    Failed(SubscriptionError),
}

/// What an applied message did, reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorChange {
    Replaced { revision: u64, records: usize },
    Failed(SubscriptionError),
}

#[derive(Debug, Default)]
struct MirrorState {
    records: Vec<Record>,
    status: MirrorStatus,
    /// Bumped on every applied snapshot; keys projection memoization.
    revision: u64,
    /// Store version of the applied snapshot.
    version: Option<u64>,
}

impl MirrorState {
    fn apply(&mut self, message: MirrorMessage) -> Option<MirrorChange> {
        match message {
            MirrorMessage::Replace { version, records } => {
                if self.version.is_some_and(|current| version < current) {
                    tracing::debug!(version, current = ?self.version, "ignoring stale snapshot");
                    return None;
                }
                self.records = records;
                self.status = MirrorStatus::Ready;
                self.revision += 1;
                self.version = Some(version);
                tracing::debug!(
                    revision = self.revision,
                    records = self.records.len(),
                    "mirror replaced"
                );
                Some(MirrorChange::Replaced {
                    revision: self.revision,
                    records: self.records.len(),
                })
            }
            MirrorMessage::Failed(err) => {
                tracing::warn!("{err}; keeping last snapshot");
                self.status = MirrorStatus::Failed(err.clone());
                Some(MirrorChange::Failed(err))
            }
        }
    }
}

/// Read-only handle to mirror state.
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    state: Arc<RwLock<MirrorState>>,
}

impl Mirror {
    fn read(&self) -> RwLockReadGuard<'_, MirrorState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current record set.
    pub fn records(&self) -> Vec<Record> {
        self.read().records.clone()
    }

    /// Run `f` against the current records and revision without copying.
    pub fn with_records<T>(&self, f: impl FnOnce(u64, &[Record]) -> T) -> T {
        let state = self.read();
        f(state.revision, &state.records)
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.read().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    pub fn status(&self) -> MirrorStatus {
        self.read().status.clone()
    }

    pub fn revision(&self) -> u64 {
        self.read().revision
    }
}

/// A mirror plus the subscription feeding it.
///
/// Acquired with [`LiveMirror::subscribe`]; the subscription is released by
/// [`unsubscribe`](LiveMirror::unsubscribe) or on drop.
#[derive(Debug)]
pub struct LiveMirror {
    mirror: Mirror,
    subscription: Subscription,
}

impl LiveMirror {
    /// Subscribe to `collection` and mirror it.
    ///
    /// `observer` runs after each applied message, outside the state lock,
    /// on whatever thread the store delivers from.
    pub fn subscribe<S, F>(store: &S, collection: &str, observer: F) -> Result<Self, StoreError>
    where
        S: DocumentStore,
        F: Fn(&MirrorChange) + Send + Sync + 'static,
    {
        let mirror = Mirror::default();
        let state = Arc::clone(&mirror.state);

        let subscription = store
            .documents_in::<Record>(collection)
            .subscribe(move |delivery| {
                let message = match delivery {
                    Ok((version, records)) => MirrorMessage::Replace { version, records },
                    Err(err) => MirrorMessage::Failed(SubscriptionError::from(err)),
                };
                let change = state
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .apply(message);
                if let Some(change) = change {
                    observer(&change);
                }
            })?;

        Ok(Self {
            mirror,
            subscription,
        })
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop following the store. Idempotent; the last snapshot stays readable.
    pub fn unsubscribe(&mut self) {
        self.subscription.unsubscribe();
    }
}
