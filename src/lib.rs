//! Reactive inventory catalog view.
//!
//! A [`LiveMirror`] follows a remote [`DocumentStore`] collection by replacing
//! its records wholesale on every snapshot. [`project`] turns the mirror plus
//! [`ViewParameters`] into brand groups. [`MutationCoordinator`] validates and
//! writes add/update/delete requests, and never touches the mirror: the store's
//! next snapshot settles what the view shows. [`InventoryView`] ties the pieces
//! together for a presentation layer.

extern crate self as stockroom;

mod config;
mod document;
mod error;
mod mirror;
mod mutation;
mod params;
mod projection;
mod record;
mod store;
mod view;

pub use config::ViewConfig;
pub use document::{Document, Fields, StoredDocument};
pub use error::{MutationError, StoreError, SubscriptionError, ValidationError, WriteOp};
pub use mirror::{LiveMirror, Mirror, MirrorChange, MirrorMessage, MirrorStatus};
pub use mutation::{ConfirmedDelete, DeleteConfirmation, MutationCoordinator};
pub use params::{SortMode, UnknownSortMode, ViewParameters};
pub use projection::{project, BrandGroup, BrandOption, Projection, ProjectionCache};
pub use record::{parse_count, parse_price, EditDraft, Record, RecordDraft};
pub use store::{
    Delivery, DocumentCollection, DocumentStore, DocumentsExt, InMemoryDocumentStore, Snapshot,
    SnapshotListener, Subscription,
};
pub use view::{events, InputFocus, InventoryView, SnapshotNotice};

pub use stockroom_macros::Document;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
