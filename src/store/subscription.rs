//! Subscription - the release handle for a live snapshot feed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Release = Box<dyn FnOnce() + Send>;

/// Handle for one live subscription.
///
/// Releasing is idempotent and also happens on drop, so every exit path of
/// the owner stops deliveries.
pub struct Subscription {
    active: Arc<AtomicBool>,
    release: Option<Release>,
}

impl Subscription {
    /// Build a handle. `active` is cleared on release and must be checked by
    /// the store before each delivery; `release` detaches the listener.
    pub fn new(active: Arc<AtomicBool>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            active,
            release: Some(Box::new(release)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop all further deliveries. Calling again does nothing.
    pub fn unsubscribe(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(release) = self.release.take() {
            release();
            tracing::debug!("subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
