//! Memory item: the atomic unit held in working memory.
//!
//! Items are created on insertion into working memory, decay over time, and
//! on eviction are either promoted into a long-term tier (by [`MemoryKind`])
//! or dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound of the importance scale.
pub const MAX_IMPORTANCE: f64 = 100.0;

/// What an item remembers; decides the long-term tier it consolidates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Consolidates into a semantic concept.
    Concept,
    /// Consolidates into a semantic pattern.
    Pattern,
    /// Consolidates into a procedural procedure.
    Procedure,
    /// Consolidates into a semantic knowledge fact.
    Fact,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Pattern => "pattern",
            Self::Procedure => "procedure",
            Self::Fact => "fact",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single working-memory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique ID for this item
    pub id: String,

    /// The remembered content
    pub content: String,

    pub kind: MemoryKind,

    /// Effective importance in [0, 100], rewritten by every decay pass
    pub importance: f64,

    /// Importance at insertion or last reinforcement; decay is computed from it
    pub anchor_importance: f64,

    /// How many times the item was reinforced
    #[serde(default)]
    pub access_count: u32,

    pub created_at: DateTime<Utc>,

    pub last_accessed_at: DateTime<Utc>,

    /// IDs of related items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associations: Vec<String>,
}

impl MemoryItem {
    /// Create an item with clamped importance, stamped at `now`.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        kind: MemoryKind,
        importance: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let importance = clamp_importance(importance);
        Self {
            id: id.into(),
            content: content.into(),
            kind,
            importance,
            anchor_importance: importance,
            access_count: 0,
            created_at: now,
            last_accessed_at: now,
            associations: Vec::new(),
        }
    }

    /// Attach related item IDs.
    pub fn with_associations(mut self, ids: Vec<String>) -> Self {
        self.associations = ids;
        self
    }

    /// Fractional days since the last access, never negative.
    pub fn days_since_access(&self, now: DateTime<Utc>) -> f64 {
        let secs = (now - self.last_accessed_at).num_seconds().max(0) as f64;
        secs / 86_400.0
    }
}

/// Clamp an importance value into [0, 100], mapping NaN to 0.
pub fn clamp_importance(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_IMPORTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_item_clamps_importance() {
        let now = Utc::now();
        let item = MemoryItem::new("m1", "too loud", MemoryKind::Fact, 250.0, now);
        assert_eq!(item.importance, 100.0);
        assert_eq!(item.anchor_importance, 100.0);

        let item = MemoryItem::new("m2", "negative", MemoryKind::Fact, -3.0, now);
        assert_eq!(item.importance, 0.0);
    }

    #[test]
    fn days_since_access_is_fractional() {
        let now = Utc::now();
        let item = MemoryItem::new("m1", "x", MemoryKind::Concept, 50.0, now);
        let later = now + Duration::hours(36);
        assert!((item.days_since_access(later) - 1.5).abs() < 1e-9);
        assert_eq!(item.days_since_access(now - Duration::hours(1)), 0.0);
    }

    #[test]
    fn item_serialization_roundtrip() {
        let item = MemoryItem::new("m1", "Use FlexLayout", MemoryKind::Pattern, 80.0, Utc::now())
            .with_associations(vec!["m0".into()]);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"pattern\""));
        let back: MemoryItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "m1");
        assert_eq!(back.associations, vec!["m0".to_string()]);
    }

    #[test]
    fn clamp_handles_nan() {
        assert_eq!(clamp_importance(f64::NAN), 0.0);
    }
}
