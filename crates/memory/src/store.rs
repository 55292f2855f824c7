//! The four-tier memory store.
//!
//! Working memory is the only tier that forgets. Items leave it by recency
//! eviction or by decaying below the strength floor; either way the item is
//! offered to [`MemoryStore::consolidate`], which promotes it into the
//! long-term tier matching its [`MemoryKind`] when it is important enough.
//!
//! Persistence never fails the caller: load and save return warning lists and
//! keep whatever state they could build.

use crate::decay::DecayPolicy;
use crate::episodic::{EpisodicMemory, Interaction, Outcome, Session};
use crate::procedural::{ProceduralMemory, Procedure};
use crate::semantic::{Concept, KnowledgeFact, Pattern, SemanticMemory};
use crate::snapshot::{SnapshotStore, Tier};
use crate::working::{DecayReport, WorkingMemory, WorkingSnapshot};
use chrono::{DateTime, Utc};
use ctxforge_core::error::MemoryError;
use ctxforge_core::memory::{MAX_IMPORTANCE, MemoryItem, MemoryKind};
use ctxforge_core::{Clock, IdGenerator};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest name derived from item content on consolidation.
const NAME_LIMIT: usize = 60;

// ── Search types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring; empty matches everything.
    pub text: String,
    pub kind: Option<MemoryKind>,
    pub min_importance: f64,
    /// Applied after sorting.
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: MemoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_min_importance(mut self, min: f64) -> Self {
        self.min_importance = min;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub kind: MemoryKind,
    pub importance: f64,
    /// Last access for working items, last update for long-term records.
    pub last_seen: DateTime<Utc>,
    pub tier: Tier,
}

// ── Store ──────────────────────────────────────────────────────────────────

pub struct MemoryStore {
    policy: DecayPolicy,
    working: WorkingMemory,
    episodic: EpisodicMemory,
    semantic: SemanticMemory,
    procedural: ProceduralMemory,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl MemoryStore {
    pub fn new(
        policy: DecayPolicy,
        working_capacity: usize,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            policy,
            working: WorkingMemory::new(working_capacity),
            episodic: EpisodicMemory::default(),
            semantic: SemanticMemory::default(),
            procedural: ProceduralMemory::default(),
            clock,
            ids,
            snapshots,
        }
    }

    pub fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    pub fn working(&self) -> &WorkingMemory {
        &self.working
    }

    pub fn episodic(&self) -> &EpisodicMemory {
        &self.episodic
    }

    pub fn semantic(&self) -> &SemanticMemory {
        &self.semantic
    }

    pub fn semantic_mut(&mut self) -> &mut SemanticMemory {
        &mut self.semantic
    }

    pub fn procedural(&self) -> &ProceduralMemory {
        &self.procedural
    }

    pub fn procedural_mut(&mut self) -> &mut ProceduralMemory {
        &mut self.procedural
    }

    // ── Working tier ───────────────────────────────────────────────────────

    /// Store new content in working memory and return its id. Whatever the
    /// insertion evicts is offered for consolidation.
    pub fn remember(&mut self, content: impl Into<String>, kind: MemoryKind, importance: f64) -> String {
        let item = MemoryItem::new(
            self.ids.next_id("mem"),
            content,
            kind,
            importance,
            self.clock.now(),
        );
        self.insert(item)
    }

    /// Insert a fully built item, returning its id.
    pub fn insert(&mut self, item: MemoryItem) -> String {
        let id = item.id.clone();
        debug!(id = %id, kind = %item.kind, importance = item.importance, "Remembering");
        if let Some(evicted) = self.working.insert(item) {
            self.consolidate(evicted);
        }
        id
    }

    /// Reinforce a working item, or bump usage on a long-term record with
    /// the same id. Returns `false` when nothing matches.
    pub fn reinforce(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        if let Some(item) = self.working.get_mut(id) {
            self.policy.reinforce(item, now);
            debug!(id, importance = item.importance, access_count = item.access_count, "Reinforced");
            return true;
        }
        let touched = self.semantic.touch(id, now) || self.procedural.touch(id, now);
        if !touched {
            debug!(id, "Nothing to reinforce");
        }
        touched
    }

    /// Run one decay pass over working memory now, consolidating what is lost.
    pub fn apply_decay(&mut self) -> DecayReport {
        let report = self.working.apply_decay(&self.policy, self.clock.now());
        for item in &report.forgotten {
            self.consolidate(item.clone());
        }
        report
    }

    /// Promote an item leaving working memory into its long-term tier.
    /// Returns the tier it landed in, or `None` if it was dropped.
    pub fn consolidate(&mut self, item: MemoryItem) -> Option<Tier> {
        if !self.policy.should_consolidate(&item) {
            debug!(id = %item.id, importance = item.importance, "Dropped below consolidation threshold");
            return None;
        }

        let now = self.clock.now();
        let ratio = item.importance / MAX_IMPORTANCE;
        let usage_count = item.access_count.max(1);
        let name = derive_name(&item.content);

        let tier = match item.kind {
            MemoryKind::Concept => {
                self.semantic.add_concept(Concept {
                    id: item.id.clone(),
                    name,
                    description: item.content.clone(),
                    usage_count,
                    confidence: ratio,
                    created_at: item.created_at,
                    updated_at: now,
                });
                Tier::Semantic
            }
            MemoryKind::Pattern => {
                self.semantic.add_pattern(Pattern {
                    id: item.id.clone(),
                    name,
                    description: item.content.clone(),
                    success_rate: ratio,
                    usage_count,
                    updated_at: now,
                });
                Tier::Semantic
            }
            MemoryKind::Fact => {
                self.semantic.add_knowledge(KnowledgeFact {
                    id: item.id.clone(),
                    statement: item.content.clone(),
                    source: Some("working_memory".into()),
                    confidence: ratio,
                    created_at: item.created_at,
                });
                Tier::Semantic
            }
            MemoryKind::Procedure => {
                let steps = item
                    .content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                self.procedural.upsert_procedure(Procedure {
                    id: item.id.clone(),
                    name,
                    steps,
                    success_rate: ratio,
                    usage_count,
                    updated_at: now,
                });
                Tier::Procedural
            }
        };

        info!(id = %item.id, kind = %item.kind, tier = %tier, importance = item.importance, "Consolidated");
        Some(tier)
    }

    // ── Episodic tier ──────────────────────────────────────────────────────

    /// Open a session and return its id.
    pub fn start_session(&mut self, user: impl Into<String>, goals: Vec<String>) -> String {
        let id = self.ids.next_id("session");
        self.episodic.start_session(Session {
            id: id.clone(),
            user: user.into(),
            goals,
            started_at: self.clock.now(),
            ended_at: None,
            satisfaction: None,
            lessons: Vec::new(),
        });
        info!(session = %id, "Session started");
        id
    }

    pub fn end_session(&mut self, id: &str, satisfaction: f64, lessons: Vec<String>) -> bool {
        let closed = self
            .episodic
            .end_session(id, satisfaction, lessons, self.clock.now());
        if closed {
            info!(session = id, satisfaction, "Session closed");
        }
        closed
    }

    /// The most recently started session that is still open.
    pub fn current_session(&self) -> Option<&Session> {
        self.episodic.sessions.iter().rev().find(|s| s.is_open())
    }

    pub fn record_interaction(
        &mut self,
        session_id: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        success: bool,
        token_cost: usize,
    ) {
        self.episodic.record_interaction(Interaction {
            session_id: session_id.into(),
            timestamp: self.clock.now(),
            input: input.into(),
            output: output.into(),
            success,
            token_cost,
        });
    }

    pub fn record_outcome(
        &mut self,
        session_id: impl Into<String>,
        task_id: Option<String>,
        description: impl Into<String>,
        success: bool,
        score: Option<u8>,
    ) {
        self.episodic.record_outcome(Outcome {
            session_id: session_id.into(),
            task_id,
            description: description.into(),
            success,
            score,
            timestamp: self.clock.now(),
        });
    }

    pub fn recent_interactions(&self, n: usize) -> &[Interaction] {
        self.episodic.recent_interactions(n)
    }

    // ── Search ─────────────────────────────────────────────────────────────

    /// Scan working memory and the semantic tier.
    pub fn search(&self, query: &SearchQuery) -> Vec<SearchHit> {
        let needle = query.text.to_lowercase();
        let matches = |text: &str| needle.is_empty() || text.to_lowercase().contains(&needle);
        let mut hits = Vec::new();

        for item in self.working.items() {
            if matches(&item.content) {
                hits.push(SearchHit {
                    id: item.id.clone(),
                    content: item.content.clone(),
                    kind: item.kind,
                    importance: item.importance,
                    last_seen: item.last_accessed_at,
                    tier: Tier::Working,
                });
            }
        }

        for concept in self.semantic.concepts.values() {
            if matches(&concept.name) || matches(&concept.description) {
                hits.push(SearchHit {
                    id: concept.id.clone(),
                    content: format!("{}: {}", concept.name, concept.description),
                    kind: MemoryKind::Concept,
                    importance: concept.confidence * MAX_IMPORTANCE,
                    last_seen: concept.updated_at,
                    tier: Tier::Semantic,
                });
            }
        }

        for pattern in &self.semantic.patterns {
            if matches(&pattern.name) || matches(&pattern.description) {
                hits.push(SearchHit {
                    id: pattern.id.clone(),
                    content: format!("{}: {}", pattern.name, pattern.description),
                    kind: MemoryKind::Pattern,
                    importance: pattern.success_rate * MAX_IMPORTANCE,
                    last_seen: pattern.updated_at,
                    tier: Tier::Semantic,
                });
            }
        }

        for fact in &self.semantic.knowledge {
            if matches(&fact.statement) {
                hits.push(SearchHit {
                    id: fact.id.clone(),
                    content: fact.statement.clone(),
                    kind: MemoryKind::Fact,
                    importance: fact.confidence * MAX_IMPORTANCE,
                    last_seen: fact.created_at,
                    tier: Tier::Semantic,
                });
            }
        }

        hits.retain(|h| {
            h.importance >= query.min_importance && query.kind.is_none_or(|k| k == h.kind)
        });
        hits.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.last_seen.cmp(&a.last_seen))
        });
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        hits
    }

    // ── Persistence ────────────────────────────────────────────────────────

    /// Replace every tier with its snapshot, then run a decay pass over
    /// working memory. Returns warnings; never fails.
    pub async fn load(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        let working: WorkingSnapshot = self.read_tier(Tier::Working, &mut warnings).await;
        self.episodic = self.read_tier(Tier::Episodic, &mut warnings).await;
        self.semantic = self.read_tier(Tier::Semantic, &mut warnings).await;
        self.procedural = self.read_tier(Tier::Procedural, &mut warnings).await;

        for overflow in self.working.restore(working) {
            self.consolidate(overflow);
        }
        let report = self.apply_decay();

        info!(
            backend = self.snapshots.name(),
            working = report.retained,
            forgotten = report.forgotten.len(),
            sessions = self.episodic.sessions.len(),
            concepts = self.semantic.concepts.len(),
            patterns = self.semantic.patterns.len(),
            procedures = self.procedural.procedures.len(),
            "Memory loaded"
        );
        warnings
    }

    /// Write every tier. Failures become warnings; in-memory state is kept.
    pub async fn save(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        self.write_tier(Tier::Working, &self.working.snapshot(), &mut warnings)
            .await;
        self.write_tier(Tier::Episodic, &self.episodic, &mut warnings)
            .await;
        self.write_tier(Tier::Semantic, &self.semantic, &mut warnings)
            .await;
        self.write_tier(Tier::Procedural, &self.procedural, &mut warnings)
            .await;
        if warnings.is_empty() {
            debug!(backend = self.snapshots.name(), "Memory saved");
        }
        warnings
    }

    async fn read_tier<T>(&self, tier: Tier, warnings: &mut Vec<String>) -> T
    where
        T: DeserializeOwned + Default,
    {
        let document = match self.snapshots.read(tier).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                let msg = format!("No {tier} memory snapshot found; starting empty");
                warn!(tier = %tier, "{msg}");
                warnings.push(msg);
                return T::default();
            }
            Err(e) => {
                let msg = format!("Could not read {tier} memory snapshot: {e}");
                warn!(tier = %tier, error = %e, "Snapshot unreadable, starting empty");
                warnings.push(msg);
                return T::default();
            }
        };

        match serde_json::from_str(&document) {
            Ok(value) => value,
            Err(e) => {
                let err = MemoryError::Snapshot {
                    tier: tier.to_string(),
                    reason: e.to_string(),
                };
                warn!(tier = %tier, error = %e, "Corrupt snapshot, starting empty");
                warnings.push(err.to_string());
                T::default()
            }
        }
    }

    async fn write_tier<T: Serialize>(&self, tier: Tier, value: &T, warnings: &mut Vec<String>) {
        let document = match serde_json::to_string_pretty(value) {
            Ok(document) => document,
            Err(e) => {
                let err = MemoryError::Snapshot {
                    tier: tier.to_string(),
                    reason: e.to_string(),
                };
                warn!(tier = %tier, error = %e, "Snapshot encoding failed");
                warnings.push(err.to_string());
                return;
            }
        };
        if let Err(e) = self.snapshots.write(tier, document).await {
            warn!(tier = %tier, error = %e, "Snapshot write failed");
            warnings.push(e.to_string());
        }
    }
}

/// First line of `content`, cut at [`NAME_LIMIT`] characters.
fn derive_name(content: &str) -> String {
    let first = content.lines().next().unwrap_or_default().trim();
    if first.chars().count() <= NAME_LIMIT {
        first.to_string()
    } else {
        let cut: String = first.chars().take(NAME_LIMIT).collect();
        format!("{cut}…")
    }
}
