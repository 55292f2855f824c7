//! Records produced by the two external sources: project rules and project
//! history. The engine only consumes these shapes; parsing lives in
//! `ctxforge-rules`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parsed project rules from one rule document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRules {
    /// Where the rules came from (file path or label)
    #[serde(default)]
    pub source: String,

    /// The raw document text
    #[serde(default)]
    pub raw: String,

    /// Section heading → section body
    #[serde(default)]
    pub sections: HashMap<String, String>,

    #[serde(default)]
    pub coding_standards: Vec<String>,

    #[serde(default)]
    pub forbidden_patterns: Vec<String>,

    #[serde(default)]
    pub required_patterns: Vec<String>,
}

impl ProjectRules {
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Find the first section whose heading contains `needle` (case-insensitive).
    pub fn section_matching(&self, needle: &str) -> Option<(&str, &str)> {
        let needle = needle.to_lowercase();
        let mut names: Vec<&String> = self.sections.keys().collect();
        // HashMap order is unstable; sort so lookups are deterministic.
        names.sort();
        names
            .into_iter()
            .find(|name| name.to_lowercase().contains(&needle))
            .and_then(|name| {
                self.sections
                    .get(name)
                    .map(|body| (name.as_str(), body.as_str()))
            })
    }
}

/// A released or planned milestone from the changelog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,
}

/// An architectural decision with optional rationale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Parsed project history (changelog).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub conventions: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub lessons: Vec<String>,
    #[serde(default)]
    pub active_features: Vec<String>,
    #[serde(default)]
    pub technical_debt: Vec<String>,
    #[serde(default)]
    pub upcoming_goals: Vec<String>,
}

impl ProjectContext {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.tech_stack.is_empty()
            && self.conventions.is_empty()
            && self.milestones.is_empty()
    }
}
