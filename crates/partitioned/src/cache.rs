//! Single-slot memo for the current partition listing.

use parking_lot::Mutex;
use sluice_core::Result;
use std::sync::Arc;
use tracing::debug;

/// Holds at most one listing. Cleared by every mutation of the root.
#[derive(Debug, Default)]
pub struct ListingCache {
    slot: Mutex<Option<Arc<Vec<String>>>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached listing, or compute and store it.
    ///
    /// A failed computation leaves the slot empty.
    pub fn get_or_try_init<F>(&self, list: F) -> Result<Arc<Vec<String>>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        let mut slot = self.slot.lock();
        if let Some(listing) = slot.as_ref() {
            debug!(count = listing.len(), "partition listing served from cache");
            return Ok(listing.clone());
        }
        let listing = Arc::new(list()?);
        *slot = Some(listing.clone());
        Ok(listing)
    }

    pub fn invalidate(&self) {
        self.slot.lock().take();
    }

    pub fn is_cached(&self) -> bool {
        self.slot.lock().is_some()
    }
}
