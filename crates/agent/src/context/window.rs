//! The token-budgeted context window.
//!
//! Items are admitted one at a time. An item that fits is appended; an item
//! that does not fit may displace the single lowest-priority item already in
//! the window, but only when that item ranks strictly lower and the newcomer
//! then fits. At most one eviction happens per insertion.

use crate::context::token;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ── Types ─────────────────────────────────────────────────────────────────

/// The context layer an item was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Project,
    Session,
    Conversation,
    Semantic,
    Temporal,
}

impl LayerKind {
    pub const ALL: [LayerKind; 5] = [
        LayerKind::Project,
        LayerKind::Session,
        LayerKind::Conversation,
        LayerKind::Semantic,
        LayerKind::Temporal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Session => "session",
            Self::Conversation => "conversation",
            Self::Semantic => "semantic",
            Self::Temporal => "temporal",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate fact for the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: String,
    pub content: String,
    /// Estimated token cost of `content`.
    pub tokens: usize,
    /// 0–100, higher wins.
    pub priority: u8,
    pub layer: LayerKind,
    pub added_at: DateTime<Utc>,
}

impl ContextItem {
    /// Build an item, estimating its token cost from `content`.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        priority: u8,
        layer: LayerKind,
        added_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            tokens: token::estimate_tokens(&content),
            content,
            priority: priority.min(100),
            layer,
            added_at,
        }
    }

    /// Override the estimated cost.
    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = tokens;
        self
    }
}

/// What [`ContextWindow::insert`] did with a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Added,
    /// Admitted by evicting the returned item.
    Replaced(ContextItem),
    Rejected,
}

impl InsertOutcome {
    pub fn admitted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

// ── Window ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    max_tokens: usize,
    current_tokens: usize,
    items: Vec<ContextItem>,
}

impl ContextWindow {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            current_tokens: 0,
            items: Vec::new(),
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn current_tokens(&self) -> usize {
        self.current_tokens
    }

    /// Items in admission order.
    pub fn items(&self) -> &[ContextItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    /// Admit `item` if it fits, or swap it for the lowest-priority item.
    pub fn insert(&mut self, item: ContextItem) -> InsertOutcome {
        if self.current_tokens + item.tokens <= self.max_tokens {
            self.current_tokens += item.tokens;
            self.items.push(item);
            return InsertOutcome::Added;
        }

        let Some(lowest) = self.lowest_priority_index() else {
            debug!(id = %item.id, tokens = item.tokens, budget = self.max_tokens, "Context item exceeds the whole budget");
            return InsertOutcome::Rejected;
        };
        let victim = &self.items[lowest];
        let fits_after = self.current_tokens - victim.tokens + item.tokens <= self.max_tokens;
        if victim.priority >= item.priority || !fits_after {
            debug!(
                id = %item.id,
                priority = item.priority,
                lowest = victim.priority,
                "Context item rejected"
            );
            return InsertOutcome::Rejected;
        }

        let evicted = self.items.remove(lowest);
        self.current_tokens = self.current_tokens - evicted.tokens + item.tokens;
        debug!(id = %item.id, evicted = %evicted.id, "Context item replaced a lower-priority item");
        self.items.push(item);
        InsertOutcome::Replaced(evicted)
    }

    /// Budget used, as a percentage.
    pub fn utilization(&self) -> f64 {
        if self.max_tokens == 0 {
            return 0.0;
        }
        self.current_tokens as f64 / self.max_tokens as f64 * 100.0
    }

    /// Items sorted by priority descending, ties by recency.
    pub fn ranked(&self) -> Vec<&ContextItem> {
        let mut ranked: Vec<&ContextItem> = self.items.iter().collect();
        ranked.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.added_at.cmp(&a.added_at))
        });
        ranked
    }

    /// A `## Context` block, or an empty string when nothing was admitted.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let mut out = String::from("## Context\n");
        for item in self.ranked() {
            out.push_str(&format!("- [{}] {}\n", item.layer, item.content));
        }
        out.trim_end().to_string()
    }

    // Ties go to the earliest admitted item.
    fn lowest_priority_index(&self) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .min_by_key(|(_, item)| item.priority)
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, priority: u8, tokens: usize) -> ContextItem {
        ContextItem::new(id, format!("fact {id}"), priority, LayerKind::Project, Utc::now())
            .with_tokens(tokens)
    }

    #[test]
    fn items_within_budget_are_appended() {
        let mut window = ContextWindow::new(100);
        assert_eq!(window.insert(item("a", 50, 30)), InsertOutcome::Added);
        assert_eq!(window.insert(item("b", 10, 70)), InsertOutcome::Added);
        assert_eq!(window.current_tokens(), 100);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn ascending_priorities_keep_the_top_suffix() {
        let mut window = ContextWindow::new(100);
        for (n, priority) in [10u8, 20, 30, 40, 50].into_iter().enumerate() {
            window.insert(item(&format!("i{n}"), priority, 40));
        }
        let mut kept: Vec<u8> = window.items().iter().map(|i| i.priority).collect();
        kept.sort_unstable();
        assert_eq!(kept, vec![40, 50]);
        assert_eq!(window.current_tokens(), 80);
    }

    #[test]
    fn equal_priority_never_evicts() {
        let mut window = ContextWindow::new(50);
        window.insert(item("a", 60, 40));
        assert_eq!(window.insert(item("b", 60, 40)), InsertOutcome::Rejected);
        assert!(window.contains("a"));
    }

    #[test]
    fn replacement_requires_the_candidate_to_fit() {
        let mut window = ContextWindow::new(100);
        window.insert(item("small", 10, 20));
        window.insert(item("big", 90, 80));
        // Evicting "small" frees 20 tokens; 90 still won't fit.
        let outcome = window.insert(item("huge", 95, 90));
        assert_eq!(outcome, InsertOutcome::Rejected);
        assert!(window.contains("small"));
        assert_eq!(window.current_tokens(), 100);
    }

    #[test]
    fn replaced_reports_the_evicted_item() {
        let mut window = ContextWindow::new(60);
        window.insert(item("low", 10, 30));
        window.insert(item("mid", 50, 30));
        match window.insert(item("high", 90, 30)) {
            InsertOutcome::Replaced(evicted) => assert_eq!(evicted.id, "low"),
            other => panic!("expected replacement, got {other:?}"),
        }
        assert!(window.contains("high"));
        assert_eq!(window.current_tokens(), 60);
    }

    #[test]
    fn oversized_item_rejected_from_empty_window() {
        let mut window = ContextWindow::new(10);
        assert_eq!(window.insert(item("x", 100, 11)), InsertOutcome::Rejected);
        assert!(window.is_empty());
    }

    #[test]
    fn budget_holds_for_arbitrary_sequences() {
        // Deterministic pseudo-random sequence of priorities and sizes.
        let mut seed = 7u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as usize
        };
        for budget in [0usize, 15, 64, 250] {
            let mut window = ContextWindow::new(budget);
            for n in 0..200 {
                let priority = (next() % 101) as u8;
                let tokens = next() % 90;
                window.insert(item(&format!("i{n}"), priority, tokens));
                assert!(window.current_tokens() <= window.max_tokens());
                let sum: usize = window.items().iter().map(|i| i.tokens).sum();
                assert_eq!(sum, window.current_tokens());
            }
        }
    }

    #[test]
    fn render_lists_items_by_priority() {
        let mut window = ContextWindow::new(1000);
        window.insert(ContextItem::new("a", "low fact", 10, LayerKind::Temporal, Utc::now()));
        window.insert(ContextItem::new("b", "high fact", 90, LayerKind::Project, Utc::now()));
        let text = window.render();
        assert!(text.starts_with("## Context\n- [project] high fact"));
        assert!(text.ends_with("- [temporal] low fact"));
    }

    #[test]
    fn empty_window_renders_nothing() {
        assert_eq!(ContextWindow::new(10).render(), "");
        assert_eq!(ContextWindow::new(0).utilization(), 0.0);
    }

    #[test]
    fn utilization_is_a_percentage() {
        let mut window = ContextWindow::new(200);
        window.insert(item("a", 1, 50));
        assert!((window.utilization() - 25.0).abs() < f64::EPSILON);
    }
}
