//! Working memory: a small, recency-evicted short-term tier.
//!
//! The tier itself never consolidates; it hands evicted and forgotten items
//! back to the store, which decides where they go.

use crate::decay::{DecayPolicy, DecayVerdict};
use chrono::{DateTime, Utc};
use ctxforge_core::memory::MemoryItem;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Serialized form of the working tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingSnapshot {
    #[serde(default)]
    pub items: Vec<MemoryItem>,
}

/// Result of one decay pass over working memory.
#[derive(Debug, Default)]
pub struct DecayReport {
    pub retained: usize,
    /// Items removed by this pass, importance as it stood before the pass.
    pub forgotten: Vec<MemoryItem>,
}

/// Bounded working memory; items are kept in insertion order.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    capacity: usize,
    items: Vec<MemoryItem>,
}

impl WorkingMemory {
    /// Create an empty tier. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MemoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&MemoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MemoryItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Insert an item, returning whatever had to be evicted to make room.
    ///
    /// An item whose id is already present replaces the stored copy in
    /// place and evicts nothing.
    pub fn insert(&mut self, item: MemoryItem) -> Option<MemoryItem> {
        if let Some(existing) = self.get_mut(&item.id) {
            *existing = item;
            return None;
        }

        let evicted = if self.items.len() >= self.capacity {
            self.evict_least_recent()
        } else {
            None
        };
        self.items.push(item);
        evicted
    }

    /// Remove the least-recently-accessed item (earliest inserted on ties).
    pub fn evict_least_recent(&mut self) -> Option<MemoryItem> {
        let idx = self
            .items
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.last_accessed_at.cmp(&b.last_accessed_at))
            .map(|(idx, _)| idx)?;
        let evicted = self.items.remove(idx);
        debug!(id = %evicted.id, importance = evicted.importance, "Evicted from working memory");
        Some(evicted)
    }

    pub fn remove(&mut self, id: &str) -> Option<MemoryItem> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Recompute every item's strength; drop the ones that fell below the floor.
    pub fn apply_decay(&mut self, policy: &DecayPolicy, now: DateTime<Utc>) -> DecayReport {
        let mut report = DecayReport::default();
        let mut kept = Vec::with_capacity(self.items.len());

        for mut item in self.items.drain(..) {
            match policy.evaluate(&item, now) {
                DecayVerdict::Retain(importance) => {
                    item.importance = importance;
                    kept.push(item);
                }
                DecayVerdict::Forget { strength } => {
                    debug!(id = %item.id, strength, "Working memory item decayed away");
                    report.forgotten.push(item);
                }
            }
        }

        report.retained = kept.len();
        self.items = kept;
        report
    }

    /// Replace the contents from a snapshot, evicting overflow (oldest
    /// access first) when the snapshot holds more than the capacity.
    pub fn restore(&mut self, snapshot: WorkingSnapshot) -> Vec<MemoryItem> {
        self.items = snapshot.items;
        let mut overflow = Vec::new();
        while self.items.len() > self.capacity {
            if let Some(evicted) = self.evict_least_recent() {
                overflow.push(evicted);
            }
        }
        overflow
    }

    pub fn snapshot(&self) -> WorkingSnapshot {
        WorkingSnapshot {
            items: self.items.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
