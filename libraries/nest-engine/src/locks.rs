//! Per-owner write serialization

use nest_core::OwnerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per owner
///
/// A move or reparent touches two containers and its cycle check spans the
/// whole forest, so writes are serialized per owner rather than per container.
#[derive(Debug, Default)]
pub struct OwnerLocks {
    registry: Mutex<HashMap<OwnerId, Arc<Mutex<()>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `owner`'s forest
    ///
    /// Entries nobody holds or waits on are dropped here, so the registry
    /// only grows with the number of owners writing at the same time.
    pub async fn acquire(&self, owner: &OwnerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.registry.lock().await;
            registry.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(registry.entry(owner.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Owners with a lock entry
    pub async fn tracked(&self) -> usize {
        self.registry.lock().await.len()
    }
}
