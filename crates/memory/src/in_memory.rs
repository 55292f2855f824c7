//! In-memory snapshots, useful for tests and ephemeral sessions.

use crate::snapshot::{SnapshotStore, Tier};
use async_trait::async_trait;
use ctxforge_core::error::MemoryError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps tier documents in a map. Clones share the same map, so a second
/// store built from a clone sees what the first one saved.
#[derive(Clone, Default)]
pub struct InMemorySnapshots {
    documents: Arc<RwLock<HashMap<Tier, String>>>,
}

impl InMemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tier directly, e.g. with deliberately corrupt content.
    pub async fn put(&self, tier: Tier, document: impl Into<String>) {
        self.documents.write().await.insert(tier, document.into());
    }

    pub async fn get(&self, tier: Tier) -> Option<String> {
        self.documents.read().await.get(&tier).cloned()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshots {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn read(&self, tier: Tier) -> Result<Option<String>, MemoryError> {
        Ok(self.documents.read().await.get(&tier).cloned())
    }

    async fn write(&self, tier: Tier, document: String) -> Result<(), MemoryError> {
        self.documents.write().await.insert(tier, document);
        Ok(())
    }
}
