use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

/// Opaque per-session state that the host ships to every worker.
pub trait SessionStore: Send + Sync {
    fn put(&self, blob: Bytes);

    fn get(&self) -> Option<Bytes>;
}

/// Process-local store. Clones share the same slot, standing in for the host
/// distributing one blob to several workers.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<RwLock<Option<Bytes>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, blob: Bytes) {
        *self.slot.write() = Some(blob);
    }

    fn get(&self) -> Option<Bytes> {
        self.slot.read().clone()
    }
}
