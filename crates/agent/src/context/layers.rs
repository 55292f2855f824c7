//! The five context layers.
//!
//! | Layer | Item | Priority |
//! |-------|------|----------|
//! | project | overview (name, version, phase, stack) | 90 |
//! | project | relevant conventions | 75 |
//! | project | active features | 60 |
//! | session | session goals | 85 |
//! | session | current file | 65 |
//! | session | similar past tasks | 60 |
//! | conversation | established facts | 80 |
//! | conversation | clarified concepts | 70 |
//! | conversation | user preferences | 55 |
//! | semantic | top patterns | 80 |
//! | semantic | concepts mentioned | 65 |
//! | semantic | knowledge mentioned | 45 |
//! | temporal | file changes within the hour | 70 |
//! | temporal | working pace | 50 |
//! | temporal | recent milestones | 40 |

use crate::context::assembler::ContextRequest;
use crate::context::relevance;
use crate::context::window::{ContextItem, LayerKind};
use chrono::{DateTime, Duration, Utc};
use ctxforge_core::project::Milestone;
use ctxforge_core::{ProjectContext, TaskKind};
use ctxforge_memory::SemanticMemory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A source of candidate context items.
pub trait ContextLayer {
    fn kind(&self) -> LayerKind;

    /// Zero to three items for `request`.
    fn candidates(&self, request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem>;
}

fn item(layer: LayerKind, slug: &str, content: String, priority: u8, now: DateTime<Utc>) -> ContextItem {
    ContextItem::new(format!("{layer}:{slug}"), content, priority, layer, now)
}

// ── Project ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ProjectLayer {
    pub project: ProjectContext,
}

impl ProjectLayer {
    fn overview(&self) -> Option<String> {
        let p = &self.project;
        if p.name.is_empty() && p.version.is_empty() && p.tech_stack.is_empty() {
            return None;
        }
        let mut text = if p.name.is_empty() {
            "Project".to_string()
        } else {
            format!("Project: {}", p.name)
        };
        if !p.version.is_empty() {
            text.push_str(&format!(" v{}", p.version));
        }
        if !p.phase.is_empty() {
            text.push_str(&format!(" ({})", p.phase));
        }
        if !p.tech_stack.is_empty() {
            text.push_str(&format!("; stack: {}", p.tech_stack.join(", ")));
        }
        Some(text)
    }
}

impl ContextLayer for ProjectLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Project
    }

    fn candidates(&self, request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem> {
        let layer = self.kind();
        let mut items = Vec::new();
        if let Some(overview) = self.overview() {
            items.push(item(layer, "overview", overview, 90, now));
        }

        let conventions: Vec<&str> = self
            .project
            .conventions
            .iter()
            .filter(|c| relevance::is_relevant(c, request.task_kind))
            .map(String::as_str)
            .collect();
        if !conventions.is_empty() {
            items.push(item(
                layer,
                "conventions",
                format!("Conventions: {}", conventions.join("; ")),
                75,
                now,
            ));
        }

        if !self.project.active_features.is_empty() {
            items.push(item(
                layer,
                "active_features",
                format!("Active features: {}", self.project.active_features.join(", ")),
                60,
                now,
            ));
        }
        items
    }
}

// ── Session ───────────────────────────────────────────────────────────────

/// A finished task remembered for similarity hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastTask {
    pub title: String,
    pub kind: TaskKind,
    pub success: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SessionLayer {
    pub goals: Vec<String>,
    pub current_file: Option<String>,
    /// Oldest first.
    pub past_tasks: Vec<PastTask>,
}

/// Past tasks listed per prompt.
const MAX_PAST_TASKS: usize = 3;

impl ContextLayer for SessionLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Session
    }

    fn candidates(&self, request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem> {
        let layer = self.kind();
        let mut items = Vec::new();
        if !self.goals.is_empty() {
            items.push(item(
                layer,
                "goals",
                format!("Session goals: {}", self.goals.join("; ")),
                85,
                now,
            ));
        }

        if let Some(file) = request.current_file.as_ref().or(self.current_file.as_ref()) {
            items.push(item(layer, "current_file", format!("Current file: {file}"), 65, now));
        }

        let similar: Vec<String> = self
            .past_tasks
            .iter()
            .rev()
            .filter(|t| relevance::is_relevant(&format!("{} {}", t.title, t.kind), request.task_kind))
            .take(MAX_PAST_TASKS)
            .map(|t| {
                let status = if t.success { "completed" } else { "failed" };
                format!("{} ({status})", t.title)
            })
            .collect();
        if !similar.is_empty() {
            items.push(item(
                layer,
                "past_tasks",
                format!("Similar past tasks: {}", similar.join("; ")),
                60,
                now,
            ));
        }
        items
    }
}

// ── Conversation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ConversationLayer {
    pub established: Vec<String>,
    pub clarified: Vec<String>,
    pub preferences: BTreeMap<String, String>,
}

impl ContextLayer for ConversationLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Conversation
    }

    fn candidates(&self, _request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem> {
        let layer = self.kind();
        let mut items = Vec::new();
        if !self.established.is_empty() {
            items.push(item(
                layer,
                "established",
                format!("Established: {}", self.established.join("; ")),
                80,
                now,
            ));
        }
        if !self.clarified.is_empty() {
            items.push(item(
                layer,
                "clarified",
                format!("Clarified concepts: {}", self.clarified.join("; ")),
                70,
                now,
            ));
        }
        if !self.preferences.is_empty() {
            let prefs: Vec<String> = self
                .preferences
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            items.push(item(
                layer,
                "preferences",
                format!("User preferences: {}", prefs.join(", ")),
                55,
                now,
            ));
        }
        items
    }
}

// ── Semantic ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SemanticLayer {
    pub memory: SemanticMemory,
}

const TOP_PATTERNS: usize = 3;

const STOPWORDS: &[&str] = &[
    "about", "could", "from", "have", "into", "should", "than", "that", "them", "then", "they",
    "this", "what", "when", "will", "with", "would", "your",
];

fn significant_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

impl ContextLayer for SemanticLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Semantic
    }

    fn candidates(&self, request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem> {
        let layer = self.kind();
        let mut items = Vec::new();

        let patterns: Vec<String> = self
            .memory
            .top_patterns(TOP_PATTERNS)
            .into_iter()
            .map(|p| format!("{} ({:.0}% success)", p.name, p.success_rate * 100.0))
            .collect();
        if !patterns.is_empty() {
            items.push(item(
                layer,
                "patterns",
                format!("Proven patterns: {}", patterns.join("; ")),
                80,
                now,
            ));
        }

        let text = request.user_text.to_lowercase();
        let mut concepts: Vec<_> = self
            .memory
            .concepts
            .values()
            .filter(|c| !c.name.trim().is_empty() && text.contains(&c.name.to_lowercase()))
            .collect();
        concepts.sort_by(|a, b| a.name.cmp(&b.name));
        if !concepts.is_empty() {
            let described: Vec<String> = concepts
                .iter()
                .map(|c| {
                    if c.description.is_empty() {
                        c.name.clone()
                    } else {
                        format!("{}: {}", c.name, c.description)
                    }
                })
                .collect();
            items.push(item(
                layer,
                "concepts",
                format!("Relevant concepts: {}", described.join("; ")),
                65,
                now,
            ));
        }

        let words = significant_words(&request.user_text);
        let facts: Vec<&str> = self
            .memory
            .knowledge
            .iter()
            .filter(|k| !significant_words(&k.statement).is_disjoint(&words))
            .map(|k| k.statement.as_str())
            .collect();
        if !facts.is_empty() {
            items.push(item(
                layer,
                "knowledge",
                format!("Known facts: {}", facts.join("; ")),
                45,
                now,
            ));
        }
        items
    }
}

// ── Temporal ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TemporalLayer {
    pub file_changes: Vec<FileChange>,
    pub interaction_times: Vec<DateTime<Utc>>,
    /// Newest first, as they appear in the changelog.
    pub milestones: Vec<Milestone>,
}

const RECENT_MILESTONES: usize = 2;

impl TemporalLayer {
    /// Record a change at `now`, dropping changes that fell out of the last hour.
    pub fn record_change(&mut self, path: impl Into<String>, now: DateTime<Utc>) {
        self.file_changes.retain(|c| within_hour(c.changed_at, now));
        self.file_changes.push(FileChange {
            path: path.into(),
            changed_at: now,
        });
    }
}

fn within_hour(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(at) <= Duration::hours(1)
}

fn pace_label(per_hour: usize) -> &'static str {
    match per_hour {
        0 => "idle",
        1..=2 => "slow",
        3..=9 => "steady",
        _ => "rapid",
    }
}

fn describe_milestone(m: &Milestone) -> String {
    match (&m.version, &m.date) {
        (Some(v), Some(d)) => format!("{v} ({d})"),
        (Some(v), None) => v.clone(),
        _ => m.title.clone(),
    }
}

impl ContextLayer for TemporalLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Temporal
    }

    fn candidates(&self, _request: &ContextRequest, now: DateTime<Utc>) -> Vec<ContextItem> {
        let layer = self.kind();
        let mut items = Vec::new();

        let mut seen = HashSet::new();
        let recent: Vec<&str> = self
            .file_changes
            .iter()
            .rev()
            .filter(|c| within_hour(c.changed_at, now))
            .filter(|c| seen.insert(c.path.as_str()))
            .map(|c| c.path.as_str())
            .collect();
        if !recent.is_empty() {
            items.push(item(
                layer,
                "file_changes",
                format!("Recently changed: {}", recent.join(", ")),
                70,
                now,
            ));
        }

        if !self.interaction_times.is_empty() {
            let per_hour = self
                .interaction_times
                .iter()
                .filter(|t| within_hour(**t, now))
                .count();
            items.push(item(
                layer,
                "pace",
                format!(
                    "Working pace: {per_hour} interaction(s) in the last hour ({})",
                    pace_label(per_hour)
                ),
                50,
                now,
            ));
        }

        if !self.milestones.is_empty() {
            let described: Vec<String> = self
                .milestones
                .iter()
                .take(RECENT_MILESTONES)
                .map(describe_milestone)
                .collect();
            items.push(item(
                layer,
                "milestones",
                format!("Recent milestones: {}", described.join(", ")),
                40,
                now,
            ));
        }
        items
    }
}
