//! Mutation coordinator - validated add/update/delete against the store.
//!
//! The coordinator holds the store and a collection name, nothing else. It
//! has no handle on any mirror: a successful write shows up locally only when
//! the live subscription delivers the next snapshot.
//!
//! Delete is gated. [`MutationCoordinator::delete`] takes a [`ConfirmedDelete`],
//! which can only be obtained by accepting a [`DeleteConfirmation`].

use crate::error::{MutationError, StoreError, WriteOp};
use crate::record::{Record, RecordDraft};
use crate::store::{DocumentStore, DocumentsExt};

/// A pending destructive action awaiting the user's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a delete only happens once the confirmation is accepted"]
pub struct DeleteConfirmation {
    id: String,
    name: String,
}

impl DeleteConfirmation {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text for the confirmation prompt.
    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete \"{}\"?", self.name)
    }

    /// The user agreed. Yields the token [`MutationCoordinator::delete`] needs.
    pub fn accept(self) -> ConfirmedDelete {
        ConfirmedDelete { id: self.id }
    }

    /// The user declined. Nothing is sent to the store.
    pub fn cancel(self) {}
}

/// Proof that a delete was confirmed. Only [`DeleteConfirmation::accept`]
/// creates one.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfirmedDelete {
    id: String,
}

impl ConfirmedDelete {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Validates and issues writes to one collection.
#[derive(Debug, Clone)]
pub struct MutationCoordinator<S> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> MutationCoordinator<S> {
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Validate `draft` and create it under its trimmed id.
    ///
    /// Validation failures never reach the store. A key collision comes back
    /// as [`MutationError::DuplicateId`]; nothing is retried.
    pub fn add(&self, draft: &RecordDraft) -> Result<Record, MutationError> {
        let record = draft.validate()?;

        match self.records().create(&record) {
            Ok(()) => {
                tracing::info!(collection = %self.collection, id = %record.id, "item created");
                Ok(record)
            }
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::warn!(collection = %self.collection, id = %record.id, "duplicate item id");
                Err(MutationError::DuplicateId { id: record.id })
            }
            Err(source) => Err(self.write_failed(WriteOp::Create, &record.id, source)),
        }
    }

    /// Overwrite every mutable field of `record`. The id addresses the
    /// document and is not part of the body.
    pub fn update(&self, record: &Record) -> Result<(), MutationError> {
        match self.records().update(record) {
            Ok(()) => {
                tracing::info!(collection = %self.collection, id = %record.id, "item updated");
                Ok(())
            }
            Err(source) => Err(self.write_failed(WriteOp::Update, &record.id, source)),
        }
    }

    /// Start a delete. The returned confirmation must be accepted before
    /// [`delete`](Self::delete) can be called.
    pub fn confirm_delete(&self, record: &Record) -> DeleteConfirmation {
        DeleteConfirmation {
            id: record.id.clone(),
            name: record.name.clone(),
        }
    }

    pub fn delete(&self, confirmed: ConfirmedDelete) -> Result<(), MutationError> {
        match self.records().delete(&confirmed.id) {
            Ok(()) => {
                tracing::info!(collection = %self.collection, id = %confirmed.id, "item deleted");
                Ok(())
            }
            Err(source) => Err(self.write_failed(WriteOp::Delete, &confirmed.id, source)),
        }
    }

    fn records(&self) -> crate::store::DocumentCollection<'_, S, Record> {
        self.store.documents_in::<Record>(&self.collection)
    }

    fn write_failed(&self, op: WriteOp, id: &str, source: StoreError) -> MutationError {
        tracing::warn!(collection = %self.collection, id, %op, "write failed: {source}");
        MutationError::RemoteWrite {
            op,
            id: id.to_string(),
            source,
        }
    }
}
