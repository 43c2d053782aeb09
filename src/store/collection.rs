//! DocumentCollection - Typed accessor for one collection of a DocumentStore.

use std::marker::PhantomData;

use super::{DocumentStore, Snapshot, Subscription};
use crate::document::Document;
use crate::error::StoreError;

/// Typed wrapper binding a store to one collection of `D` documents.
///
/// Encodes bodies with [`Document::to_fields`] and decodes snapshots with
/// [`Document::from_document`].
pub struct DocumentCollection<'a, S, D> {
    store: &'a S,
    collection: String,
    _marker: PhantomData<D>,
}

impl<'a, S: DocumentStore, D: Document> DocumentCollection<'a, S, D> {
    pub fn new(store: &'a S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.collection
    }

    /// Create a document under `doc.id()`. Fails if the key is taken.
    pub fn create(&self, doc: &D) -> Result<(), StoreError> {
        self.store
            .create(&self.collection, doc.id(), doc.to_fields()?)
    }

    /// Overwrite every field of the document stored under `doc.id()`.
    pub fn update(&self, doc: &D) -> Result<(), StoreError> {
        self.store
            .update(&self.collection, doc.id(), doc.to_fields()?)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(&self.collection, id)
    }

    /// Subscribe with typed delivery.
    ///
    /// Documents whose bodies do not decode are skipped and logged; the rest
    /// of the snapshot is still delivered.
    pub fn subscribe<F>(&self, listener: F) -> Result<Subscription, StoreError>
    where
        F: Fn(Result<(u64, Vec<D>), StoreError>) + Send + Sync + 'static,
    {
        let collection = self.collection.clone();
        self.store.subscribe(
            &self.collection,
            Box::new(move |delivery: Result<Snapshot, StoreError>| {
                listener(delivery.map(|snapshot| (snapshot.version, decode_all(&collection, snapshot))))
            }),
        )
    }
}

fn decode_all<D: Document>(collection: &str, snapshot: Snapshot) -> Vec<D> {
    snapshot
        .documents
        .into_iter()
        .filter_map(|doc| match D::from_document(&doc.id, doc.fields) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(collection, id = %doc.id, "skipping undecodable document: {err}");
                None
            }
        })
        .collect()
}

/// Extension trait for typed collection access on any DocumentStore.
pub trait DocumentsExt: DocumentStore + Sized {
    /// Typed access to the document type's own collection.
    fn documents<D: Document>(&self) -> DocumentCollection<'_, Self, D> {
        DocumentCollection::new(self, D::COLLECTION)
    }

    /// Typed access to a named collection.
    fn documents_in<D: Document>(&self, collection: &str) -> DocumentCollection<'_, Self, D> {
        DocumentCollection::new(self, collection)
    }
}

impl<S: DocumentStore> DocumentsExt for S {}
