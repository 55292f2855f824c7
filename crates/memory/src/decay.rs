//! Forgetting curve and consolidation policy.
//!
//! ```text
//! strength = anchor × e^(−rate × days_since_access) × (1 + 0.1 × access_count)
//! ```
//!
//! `anchor` is the importance recorded at insertion or at the last
//! reinforcement, so two passes without reinforcement can only lower an
//! item's importance.

use chrono::{DateTime, Utc};
use ctxforge_core::memory::{MAX_IMPORTANCE, MemoryItem, clamp_importance};

/// Per-access multiplier applied on top of the exponential curve.
const ACCESS_BOOST: f64 = 0.1;

/// Tunables for decay, consolidation, and reinforcement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    /// Forgetting-curve rate per day.
    pub decay_rate: f64,
    /// Items whose strength drops below this are forgotten.
    pub min_strength: f64,
    /// Evicted or forgotten items at or above this importance are promoted.
    pub consolidation_threshold: f64,
    /// Importance added by one reinforcement.
    pub reinforcement_bonus: f64,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            decay_rate: 0.1,
            min_strength: 10.0,
            consolidation_threshold: 70.0,
            reinforcement_bonus: 20.0,
        }
    }
}

/// What a decay pass decided for one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayVerdict {
    /// Keep the item with this new importance.
    Retain(f64),
    /// Strength fell below the floor.
    Forget { strength: f64 },
}

impl DecayPolicy {
    /// Raw strength of `item` at `now`, before clamping.
    pub fn strength(&self, item: &MemoryItem, now: DateTime<Utc>) -> f64 {
        let days = item.days_since_access(now);
        item.anchor_importance
            * (-self.decay_rate * days).exp()
            * (1.0 + ACCESS_BOOST * f64::from(item.access_count))
    }

    pub fn evaluate(&self, item: &MemoryItem, now: DateTime<Utc>) -> DecayVerdict {
        let strength = self.strength(item, now);
        if strength < self.min_strength {
            DecayVerdict::Forget { strength }
        } else {
            DecayVerdict::Retain(strength.max(self.min_strength).min(MAX_IMPORTANCE))
        }
    }

    /// Whether an item leaving working memory deserves a long-term home.
    pub fn should_consolidate(&self, item: &MemoryItem) -> bool {
        item.importance >= self.consolidation_threshold
    }

    /// Apply one reinforcement: bump count, refresh access, raise importance.
    pub fn reinforce(&self, item: &mut MemoryItem, now: DateTime<Utc>) {
        item.access_count = item.access_count.saturating_add(1);
        item.last_accessed_at = now;
        item.importance = clamp_importance(item.importance + self.reinforcement_bonus);
        item.anchor_importance = item.importance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ctxforge_core::MemoryKind;

    fn item(importance: f64, now: DateTime<Utc>) -> MemoryItem {
        MemoryItem::new("m1", "content", MemoryKind::Concept, importance, now)
    }

    #[test]
    fn fresh_item_keeps_its_importance() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        assert_eq!(policy.evaluate(&item(60.0, now), now), DecayVerdict::Retain(60.0));
    }

    #[test]
    fn strength_follows_forgetting_curve() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let it = item(80.0, now);
        let later = now + Duration::days(5);
        let expected = 80.0 * (-0.5f64).exp();
        assert!((policy.strength(&it, later) - expected).abs() < 1e-9);
    }

    #[test]
    fn access_count_boosts_strength_but_caps_at_100() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let mut it = item(95.0, now);
        it.access_count = 5;
        assert_eq!(policy.evaluate(&it, now), DecayVerdict::Retain(100.0));
    }

    #[test]
    fn weak_items_are_forgotten() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let it = item(12.0, now);
        let verdict = policy.evaluate(&it, now + Duration::days(30));
        assert!(matches!(verdict, DecayVerdict::Forget { .. }));
    }

    #[test]
    fn decay_is_monotonic_without_reinforcement() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let mut it = item(70.0, now);
        it.access_count = 3;

        let first = match policy.evaluate(&it, now + Duration::days(1)) {
            DecayVerdict::Retain(v) => v,
            other => panic!("unexpected {other:?}"),
        };
        it.importance = first;
        let second = match policy.evaluate(&it, now + Duration::days(4)) {
            DecayVerdict::Retain(v) => v,
            other => panic!("unexpected {other:?}"),
        };
        assert!(second <= first);
    }

    #[test]
    fn reinforce_raises_importance_and_refreshes_access() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let mut it = item(50.0, now);
        let later = now + Duration::hours(3);
        policy.reinforce(&mut it, later);
        assert_eq!(it.importance, 70.0);
        assert_eq!(it.anchor_importance, 70.0);
        assert_eq!(it.access_count, 1);
        assert_eq!(it.last_accessed_at, later);
    }

    #[test]
    fn reinforce_caps_at_100() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let mut it = item(95.0, now);
        policy.reinforce(&mut it, now);
        assert_eq!(it.importance, 100.0);
    }

    #[test]
    fn consolidation_threshold_is_inclusive() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        assert!(policy.should_consolidate(&item(70.0, now)));
        assert!(!policy.should_consolidate(&item(69.9, now)));
    }
}
