//! InventoryView - the engine a presentation layer drives.
//!
//! Mounting a view acquires the one live subscription it will ever hold;
//! unmounting or dropping it releases that subscription. In between, the view
//! serves the current [`Projection`], the mirror's loading/error state, the
//! view parameters, the new-item form, the selected item, and the three
//! mutations.
//!
//! ## Example
//!
//! ```
//! use stockroom::{InMemoryDocumentStore, InventoryView, SortMode, ViewConfig};
//!
//! let store = InMemoryDocumentStore::new();
//! let mut view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();
//!
//! view.draft_mut().id = "A1".into();
//! view.draft_mut().name = "Filter".into();
//! view.draft_mut().brand = "Acme".into();
//! view.add_item().unwrap();
//!
//! view.set_sort_mode(SortMode::CountDesc);
//! assert_eq!(view.projection().len(), 1);
//!
//! view.unmount();
//! assert_eq!(store.listener_count("equipment"), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::config::ViewConfig;
use crate::error::{MutationError, StoreError};
use crate::mirror::{LiveMirror, Mirror, MirrorChange, MirrorStatus};
use crate::mutation::{ConfirmedDelete, DeleteConfirmation, MutationCoordinator};
use crate::params::{SortMode, ViewParameters};
use crate::projection::{Projection, ProjectionCache};
use crate::record::{EditDraft, Record, RecordDraft};
use crate::store::DocumentStore;

/// Event names emitted by a view.
pub mod events {
    /// A snapshot was applied. Payload: [`SnapshotNotice`](super::SnapshotNotice).
    pub const SNAPSHOT: &str = "snapshot";
    /// The live channel reported an error. Payload: the message as a `String`.
    pub const ERROR: &str = "error";
    /// View parameters changed. Payload: [`ViewParameters`](crate::ViewParameters).
    pub const PARAMS: &str = "params";
    /// Selection changed. Payload: `Option<String>` with the selected id.
    pub const SELECTION: &str = "selection";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNotice {
    pub revision: u64,
    pub records: usize,
}

/// Text-input focus, as far as the engine cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Idle,
    Focused,
    /// Focus was dropped by clearing the filters.
    Dismissed,
}

#[derive(Clone)]
struct Notifier {
    #[cfg(feature = "emitter")]
    emitter: Arc<Mutex<crate::EventEmitter>>,
}

impl Notifier {
    fn new() -> Self {
        Self {
            #[cfg(feature = "emitter")]
            emitter: Arc::new(Mutex::new(crate::EventEmitter::new())),
        }
    }

    #[cfg(feature = "emitter")]
    fn emit<T: Serialize>(&self, event: &str, value: T) {
        lock(&self.emitter).emit(event, value);
    }

    #[cfg(not(feature = "emitter"))]
    fn emit<T: Serialize>(&self, _event: &str, _value: T) {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mounted inventory view over one store collection.
pub struct InventoryView<S: DocumentStore> {
    live: LiveMirror,
    mutations: MutationCoordinator<S>,
    params: ViewParameters,
    cache: Mutex<ProjectionCache>,
    selection: Option<EditDraft>,
    draft: RecordDraft,
    add_form_open: bool,
    focus: InputFocus,
    notifier: Notifier,
}

impl<S: DocumentStore> InventoryView<S> {
    /// Subscribe to the configured collection and build the view.
    ///
    /// The mirror is `Loading` until the store's first delivery.
    pub fn mount(store: S, config: &ViewConfig) -> Result<Self, StoreError> {
        let notifier = Notifier::new();
        let observer = notifier.clone();

        let live = LiveMirror::subscribe(&store, &config.collection, move |change| match change {
            MirrorChange::Replaced { revision, records } => observer.emit(
                events::SNAPSHOT,
                SnapshotNotice {
                    revision: *revision,
                    records: *records,
                },
            ),
            MirrorChange::Failed(err) => observer.emit(events::ERROR, err.to_string()),
        })?;
        tracing::debug!(collection = %config.collection, "inventory view mounted");

        Ok(Self {
            live,
            mutations: MutationCoordinator::new(store, config.collection.clone()),
            params: ViewParameters::default(),
            cache: Mutex::new(ProjectionCache::new()),
            selection: None,
            draft: RecordDraft::default(),
            add_form_open: false,
            focus: InputFocus::default(),
            notifier,
        })
    }

    /// Release the subscription. The last snapshot stays readable.
    pub fn unmount(mut self) {
        self.live.unsubscribe();
        tracing::debug!(collection = %self.mutations.collection(), "inventory view unmounted");
    }

    pub fn is_subscribed(&self) -> bool {
        self.live.is_subscribed()
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// The current projection, recomputed only when the mirror or the
    /// parameters changed since the last call.
    pub fn projection(&self) -> Arc<Projection> {
        let mut cache = lock(&self.cache);
        self.live
            .mirror()
            .with_records(|revision, records| cache.get_or_compute(revision, &self.params, records))
    }

    /// How many times the projection has actually been computed.
    pub fn recompute_count(&self) -> usize {
        lock(&self.cache).computed()
    }

    pub fn mirror(&self) -> &Mirror {
        self.live.mirror()
    }

    pub fn status(&self) -> MirrorStatus {
        self.live.mirror().status()
    }

    pub fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    // ------------------------------------------------------------------
    // View parameters
    // ------------------------------------------------------------------

    pub fn params(&self) -> &ViewParameters {
        &self.params
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.params.set_search_text(text);
        self.params_changed();
    }

    pub fn set_brand_filter(&mut self, brand: Option<String>) {
        self.params.set_brand_filter(brand);
        self.params_changed();
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.params.set_sort_mode(mode);
        self.params_changed();
    }

    pub fn set_max_count(&mut self, max_count: Option<u64>) {
        self.params.set_max_count(max_count);
        self.params_changed();
    }

    /// Reset every parameter and drop text-input focus.
    pub fn clear_all(&mut self) {
        self.params.clear_all();
        self.focus = InputFocus::Dismissed;
        self.params_changed();
    }

    fn params_changed(&self) {
        self.notifier.emit(events::PARAMS, self.params.clone());
    }

    pub fn focus_input(&mut self) {
        self.focus = InputFocus::Focused;
    }

    pub fn input_focus(&self) -> InputFocus {
        self.focus
    }

    // ------------------------------------------------------------------
    // New item
    // ------------------------------------------------------------------

    pub fn open_add_form(&mut self) {
        self.add_form_open = true;
    }

    pub fn dismiss_add_form(&mut self) {
        self.add_form_open = false;
    }

    pub fn is_add_form_open(&self) -> bool {
        self.add_form_open
    }

    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RecordDraft {
        &mut self.draft
    }

    /// Submit the new-item draft.
    ///
    /// On success the draft is reset and the form dismissed; the record
    /// appears in the projection once the store delivers the next snapshot.
    /// On failure draft and form are left as they were.
    pub fn add_item(&mut self) -> Result<Record, MutationError> {
        let record = self.mutations.add(&self.draft)?;
        self.draft.clear();
        self.add_form_open = false;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select the mirrored record with `id` for editing.
    pub fn select(&mut self, id: &str) -> bool {
        match self.live.mirror().get(id) {
            Some(record) => {
                self.select_record(&record);
                true
            }
            None => false,
        }
    }

    pub fn select_record(&mut self, record: &Record) {
        self.selection = Some(EditDraft::from_record(record));
        self.selection_changed();
    }

    pub fn selected(&self) -> Option<&EditDraft> {
        self.selection.as_ref()
    }

    /// Edit the selected item's form state. Returns false if nothing is selected.
    pub fn edit_selected(&mut self, edit: impl FnOnce(&mut EditDraft)) -> bool {
        match self.selection.as_mut() {
            Some(draft) => {
                edit(draft);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.selection_changed();
        }
    }

    fn selection_changed(&self) {
        let id = self.selection.as_ref().map(|s| s.id().to_string());
        self.notifier.emit(events::SELECTION, id);
    }

    /// Write the selected item's edits. Clears the selection on success and
    /// keeps it on failure.
    pub fn save_selected(&mut self) -> Result<(), MutationError> {
        let record = self
            .selection
            .as_ref()
            .map(EditDraft::to_record)
            .ok_or(MutationError::NoSelection)?;
        self.mutations.update(&record)?;
        self.clear_selection();
        Ok(())
    }

    /// Ask for confirmation to delete the selected item.
    pub fn request_delete_selected(&self) -> Result<DeleteConfirmation, MutationError> {
        let record = self
            .selection
            .as_ref()
            .map(EditDraft::to_record)
            .ok_or(MutationError::NoSelection)?;
        Ok(self.mutations.confirm_delete(&record))
    }

    /// Start a delete for any record.
    pub fn request_delete(&self, record: &Record) -> DeleteConfirmation {
        self.mutations.confirm_delete(record)
    }

    /// Issue a confirmed delete. Clears the selection on success.
    pub fn delete(&mut self, confirmed: ConfirmedDelete) -> Result<(), MutationError> {
        self.mutations.delete(confirmed)?;
        self.clear_selection();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Change notifications
    // ------------------------------------------------------------------

    /// Register a listener for one of the [`events`]. Returns the listener id.
    #[cfg(feature = "emitter")]
    pub fn on<T, F>(&self, event: &str, callback: F) -> String
    where
        T: serde::de::DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        lock(&self.notifier.emitter).on(event, callback)
    }

    #[cfg(feature = "emitter")]
    pub fn remove_listener(&self, listener_id: &str) -> bool {
        lock(&self.notifier.emitter)
            .remove_listener(listener_id)
            .is_some()
    }
}
