use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;

/// Single-slot, last-write-wins store for the most recent topic payload.
///
/// Cloning shares the slot. Readers get an immutable `Bytes` handle, so a
/// later `set` never changes what an earlier `get` returned.
#[derive(Debug, Clone, Default)]
pub struct LatestValueCache {
    slot: Arc<Mutex<Option<Bytes>>>,
}

impl LatestValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached payload in full.
    pub fn set(&self, payload: Bytes) {
        // The slot only ever holds a complete value, so a poisoned lock is still consistent.
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload);
    }

    /// The last payload passed to `set`, or `None` before the first one.
    pub fn get(&self) -> Option<Bytes> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_present(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
