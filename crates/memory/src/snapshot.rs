//! Snapshot persistence seam.
//!
//! Each tier is stored as one opaque JSON document. Backends only move text
//! around; encoding and the "missing means empty" policy live in the store.

use async_trait::async_trait;
use ctxforge_core::error::MemoryError;
use serde::{Deserialize, Serialize};

/// The four persisted memory tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Working,
    Episodic,
    Semantic,
    Procedural,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::Working,
        Tier::Episodic,
        Tier::Semantic,
        Tier::Procedural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
        }
    }

    /// File name used by file-backed stores.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where tier snapshots are read from and written to.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Read a tier's document. `Ok(None)` means nothing has been saved yet.
    async fn read(&self, tier: Tier) -> Result<Option<String>, MemoryError>;

    /// Replace a tier's document.
    async fn write(&self, tier: Tier, document: String) -> Result<(), MemoryError>;
}
