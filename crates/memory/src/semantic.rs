//! Semantic memory: concepts, relationships, patterns, and knowledge facts.
//! Long-term: records here are reinforced but never expire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub description: String,
    pub usage_count: u32,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub relation: String,
    /// Strength in [0, 1]
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Success rate in [0, 1]
    pub success_rate: f64,
    pub usage_count: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFact {
    pub id: String,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticMemory {
    #[serde(default)]
    pub concepts: HashMap<String, Concept>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub knowledge: Vec<KnowledgeFact>,
}

impl SemanticMemory {
    /// Insert a concept; an existing id is reinforced (usage +1, confidence
    /// averaged) instead of replaced.
    pub fn add_concept(&mut self, concept: Concept) {
        match self.concepts.get_mut(&concept.id) {
            Some(existing) => {
                existing.confidence = ((existing.confidence + concept.confidence) / 2.0).clamp(0.0, 1.0);
                existing.usage_count = existing.usage_count.saturating_add(1);
                existing.updated_at = concept.updated_at;
            }
            None => {
                self.concepts.insert(concept.id.clone(), concept);
            }
        }
    }

    /// Insert a pattern; an existing id averages its success rate with the
    /// incoming one and bumps its usage count.
    pub fn add_pattern(&mut self, pattern: Pattern) {
        match self.patterns.iter_mut().find(|p| p.id == pattern.id) {
            Some(existing) => {
                existing.success_rate =
                    ((existing.success_rate + pattern.success_rate) / 2.0).clamp(0.0, 1.0);
                existing.usage_count = existing.usage_count.saturating_add(1);
                existing.updated_at = pattern.updated_at;
            }
            None => self.patterns.push(pattern),
        }
    }

    /// Record that a pattern was applied again, folding `success` into a
    /// running success rate. Returns `false` for unknown ids.
    pub fn record_pattern_use(&mut self, id: &str, success: bool, now: DateTime<Utc>) -> bool {
        let Some(pattern) = self.patterns.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        let n = f64::from(pattern.usage_count);
        let hit = if success { 1.0 } else { 0.0 };
        pattern.success_rate = ((pattern.success_rate * n + hit) / (n + 1.0)).clamp(0.0, 1.0);
        pattern.usage_count = pattern.usage_count.saturating_add(1);
        pattern.updated_at = now;
        true
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn add_knowledge(&mut self, fact: KnowledgeFact) {
        self.knowledge.push(fact);
    }

    /// Bump usage on a concept or pattern. Returns `false` for unknown ids.
    pub fn touch(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        if let Some(concept) = self.concepts.get_mut(id) {
            concept.usage_count = concept.usage_count.saturating_add(1);
            concept.updated_at = now;
            return true;
        }
        if let Some(pattern) = self.patterns.iter_mut().find(|p| p.id == id) {
            pattern.usage_count = pattern.usage_count.saturating_add(1);
            pattern.updated_at = now;
            return true;
        }
        false
    }

    /// Patterns by success rate, then usage count, both descending.
    pub fn top_patterns(&self, n: usize) -> Vec<&Pattern> {
        let mut sorted: Vec<&Pattern> = self.patterns.iter().collect();
        sorted.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.usage_count.cmp(&a.usage_count))
        });
        sorted.truncate(n);
        sorted
    }

    /// Relationships touching `id` in either direction.
    pub fn related(&self, id: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.from == id || r.to == id)
            .collect()
    }
}
