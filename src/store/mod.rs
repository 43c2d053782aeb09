//! Document store seam - the remote collection the mirror follows and the
//! coordinator writes to.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │ LiveMirror                   │        │ MutationCoordinator          │
//! │  subscribe() -> Subscription │        │  create / update / delete    │
//! └──────────────┬───────────────┘        └──────────────┬───────────────┘
//!                │ full snapshots                        │ keyed writes
//!                ▼                                       ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        DocumentStore trait                          │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │                                        │
//!          ▼                                        ▼
//! ┌───────────────────────┐              ┌─────────────────────────────┐
//! │ InMemoryDocumentStore │              │ hosted document databases   │
//! │ (included)            │              │ (external)                  │
//! └───────────────────────┘              └─────────────────────────────┘
//! ```

mod collection;
mod in_memory;
mod subscription;

use std::sync::Arc;

use crate::document::{Fields, StoredDocument};
use crate::error::StoreError;

pub use collection::{DocumentCollection, DocumentsExt};
pub use in_memory::{Delivery, InMemoryDocumentStore};
pub use subscription::Subscription;

/// A full copy of a collection as of one store version.
///
/// Versions only grow; a listener may see gaps when the store coalesces
/// several writes into one delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: u64,
    pub documents: Vec<StoredDocument>,
}

/// Callback receiving every snapshot (or channel failure) for a subscription.
pub type SnapshotListener = Box<dyn Fn(Result<Snapshot, StoreError>) + Send + Sync>;

/// Keyed document collections with a live full-snapshot feed.
///
/// - `subscribe` delivers the current snapshot, then a fresh one after every
///   change, until the returned [`Subscription`] is released. Channel errors are
///   delivered to the same listener and do not end the subscription.
/// - `create` fails with [`StoreError::AlreadyExists`] if the key is taken.
/// - `update` overwrites the whole body and fails with
///   [`StoreError::NotFound`] if the key is missing; so does `delete`.
pub trait DocumentStore: Send + Sync {
    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Result<Subscription, StoreError>;

    fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Result<Subscription, StoreError> {
        (**self).subscribe(collection, listener)
    }

    fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        (**self).create(collection, id, fields)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        (**self).update(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        (**self).delete(collection, id)
    }
}
