//! Context assembly pipeline.
//!
//! Gathers candidates from the five layers, ranks them by priority (ties by
//! recency), and packs them into a [`ContextWindow`] with a single greedy
//! pass. There is no backtracking: an item that cannot fit and cannot
//! displace a lower-priority item is dropped.
//!
//! # Determinism
//!
//! Identical layer state, request, and `now` always produce the same window.

use crate::context::layers::{
    ContextLayer, ConversationLayer, ProjectLayer, SemanticLayer, SessionLayer, TemporalLayer,
};
use crate::context::window::{ContextItem, ContextWindow, InsertOutcome, LayerKind};
use chrono::{DateTime, Utc};
use ctxforge_core::TaskKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Types ─────────────────────────────────────────────────────────────────

/// What the caller is about to ask for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRequest {
    /// Drives keyword gating; `None` admits every convention and past task.
    pub task_kind: Option<TaskKind>,
    pub user_text: String,
    pub current_file: Option<String>,
}

impl ContextRequest {
    pub fn new(task_kind: Option<TaskKind>, user_text: impl Into<String>) -> Self {
        Self {
            task_kind,
            user_text: user_text.into(),
            current_file: None,
        }
    }

    pub fn with_current_file(mut self, path: impl Into<String>) -> Self {
        self.current_file = Some(path.into());
        self
    }
}

/// Statistics for a single context layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    pub layer: LayerKind,
    /// Tokens this layer holds in the final window.
    pub tokens: usize,
    pub items_included: usize,
    pub items_total: usize,
}

/// A candidate that did not make it into the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropInfo {
    pub id: String,
    pub layer: LayerKind,
    pub priority: u8,
    pub tokens: usize,
}

/// The packed window plus how each layer fared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    pub window: ContextWindow,
    pub per_layer: Vec<LayerStats>,
    pub drops: Vec<DropInfo>,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Holds the five layers and packs them on demand.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_tokens: usize,
    pub project: ProjectLayer,
    pub session: SessionLayer,
    pub conversation: ConversationLayer,
    pub semantic: SemanticLayer,
    pub temporal: TemporalLayer,
}

impl ContextAssembler {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            project: ProjectLayer::default(),
            session: SessionLayer::default(),
            conversation: ConversationLayer::default(),
            semantic: SemanticLayer::default(),
            temporal: TemporalLayer::default(),
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn layers(&self) -> [&dyn ContextLayer; 5] {
        [
            &self.project,
            &self.session,
            &self.conversation,
            &self.semantic,
            &self.temporal,
        ]
    }

    /// Every candidate, ranked by priority descending then `added_at`
    /// descending. Layer order breaks any remaining tie.
    pub fn candidates(&self, request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem> {
        let mut all: Vec<ContextItem> = self
            .layers()
            .iter()
            .flat_map(|layer| layer.candidates(request, now))
            .collect();
        all.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.added_at.cmp(&a.added_at))
        });
        all
    }

    /// Pack the ranked candidates into a fresh window.
    pub fn build(&self, request: &ContextRequest, now: DateTime<Utc>) -> ContextWindow {
        self.assemble(request, now).window
    }

    /// Like [`build`](Self::build), with per-layer statistics and drops.
    pub fn assemble(&self, request: &ContextRequest, now: DateTime<Utc>) -> AssembledContext {
        let candidates = self.candidates(request, now);
        let mut window = ContextWindow::new(self.max_tokens);
        let mut drops = Vec::new();

        for candidate in &candidates {
            match window.insert(candidate.clone()) {
                InsertOutcome::Added => {}
                InsertOutcome::Replaced(evicted) => drops.push(drop_info(&evicted)),
                InsertOutcome::Rejected => drops.push(drop_info(candidate)),
            }
        }

        let per_layer = LayerKind::ALL
            .into_iter()
            .map(|layer| {
                let included: Vec<&ContextItem> =
                    window.items().iter().filter(|i| i.layer == layer).collect();
                LayerStats {
                    layer,
                    tokens: included.iter().map(|i| i.tokens).sum(),
                    items_included: included.len(),
                    items_total: candidates.iter().filter(|c| c.layer == layer).count(),
                }
            })
            .collect();

        debug!(
            candidates = candidates.len(),
            included = window.len(),
            dropped = drops.len(),
            tokens = window.current_tokens(),
            budget = self.max_tokens,
            "Context assembled"
        );

        AssembledContext {
            window,
            per_layer,
            drops,
        }
    }
}

fn drop_info(item: &ContextItem) -> DropInfo {
    DropInfo {
        id: item.id.clone(),
        layer: item.layer,
        priority: item.priority,
        tokens: item.tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::layers::{FileChange, PastTask};
    use chrono::Duration;
    use ctxforge_core::ProjectContext;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn populated(max_tokens: usize) -> ContextAssembler {
        let mut asm = ContextAssembler::new(max_tokens);
        asm.project.project = ProjectContext {
            name: "Shopfront".into(),
            version: "1.0.0".into(),
            conventions: vec!["Prefer theme tokens".into(), "Keep routes flat".into()],
            ..ProjectContext::default()
        };
        asm.session.goals = vec!["Polish the pricing page".into()];
        asm.session.past_tasks = vec![PastTask {
            title: "Restyle header".into(),
            kind: TaskKind::UpdateStyles,
            success: true,
        }];
        asm.conversation.established = vec!["Dark mode is required".into()];
        asm.temporal.file_changes = vec![FileChange {
            path: "src/Header.tsx".into(),
            changed_at: now() - Duration::minutes(10),
        }];
        asm
    }

    #[test]
    fn candidates_are_ranked_by_priority() {
        let asm = populated(8000);
        let ranked = asm.candidates(&ContextRequest::new(None, "hi"), now());
        let priorities: Vec<u8> = ranked.iter().map(|c| c.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
        assert_eq!(ranked[0].id, "project:overview");
    }

    #[test]
    fn generous_budget_includes_everything() {
        let asm = populated(8000);
        let assembled = asm.assemble(&ContextRequest::new(None, "hi"), now());
        assert!(assembled.drops.is_empty());
        let total: usize = assembled.per_layer.iter().map(|s| s.items_total).sum();
        assert_eq!(assembled.window.len(), total);
        let rendered = assembled.window.render();
        assert!(rendered.contains("Conventions: Prefer theme tokens; Keep routes flat"));
        assert!(rendered.contains("Recently changed: src/Header.tsx"));
    }

    #[test]
    fn task_kind_gates_conventions() {
        let asm = populated(8000);
        let window = asm.build(&ContextRequest::new(Some(TaskKind::UpdateStyles), ""), now());
        let rendered = window.render();
        assert!(rendered.contains("Conventions: Prefer theme tokens"));
        assert!(!rendered.contains("Keep routes flat"));
    }

    #[test]
    fn tight_budget_keeps_highest_priorities() {
        let asm = populated(8000);
        let request = ContextRequest::new(None, "hi");
        let ranked = asm.candidates(&request, now());
        // Room for exactly the two top-ranked items.
        let budget = ranked[0].tokens + ranked[1].tokens;
        let asm = ContextAssembler { max_tokens: budget, ..asm };
        let assembled = asm.assemble(&request, now());
        assert!(assembled.window.current_tokens() <= budget);
        assert!(assembled.window.contains(&ranked[0].id));
        assert!(!assembled.drops.is_empty());
    }

    #[test]
    fn per_layer_stats_match_the_window() {
        let asm = populated(8000);
        let assembled = asm.assemble(&ContextRequest::new(None, "hi"), now());
        let project = assembled
            .per_layer
            .iter()
            .find(|s| s.layer == LayerKind::Project)
            .unwrap();
        assert_eq!(project.items_included, 2);
        let tokens: usize = assembled.per_layer.iter().map(|s| s.tokens).sum();
        assert_eq!(tokens, assembled.window.current_tokens());
    }

    #[test]
    fn deterministic_assembly() {
        let asm = populated(120);
        let request = ContextRequest::new(Some(TaskKind::UpdateStyles), "tokens").with_current_file("src/a.tsx");
        let a = asm.build(&request, now()).render();
        let b = asm.build(&request, now()).render();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_layers_produce_an_empty_window() {
        let asm = ContextAssembler::new(8000);
        let window = asm.build(&ContextRequest::new(None, "hello"), now());
        assert!(window.is_empty());
        assert_eq!(window.render(), "");
    }
}
