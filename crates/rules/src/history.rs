//! Changelog parser producing a [`ProjectContext`].
//!
//! Recognised layout (every part optional):
//!
//! ```text
//! # Atlas                       <- project name (first `# ` heading)
//! Version: 2.1.0
//! Phase: beta
//!
//! ## Tech Stack                 <- bullets per section, by heading keyword
//! - React 18
//!
//! ## [2.1.0] - 2026-03-02       <- milestone; bullets become highlights
//! ### Added
//! - Dark mode
//! ```

use crate::rules::bullet_text;
use ctxforge_core::project::{Decision, Milestone};
use ctxforge_core::ProjectContext;
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::debug;

static MILESTONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[?v?(\d+\.\d+\.\d+[0-9A-Za-z.\-+]*)\]?(?:\s*[-–—]\s*(.+))?$")
        .expect("Invalid milestone regex")
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)\**(version|phase)\**\s*:\s*\**\s*(.+?)\s*$").expect("Invalid field regex")
});

static RATIONALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:because|—|--)\s+").expect("Invalid rationale regex")
});

/// Where bullets under the current `## ` heading go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    TechStack,
    Conventions,
    Decisions,
    Lessons,
    ActiveFeatures,
    TechnicalDebt,
    UpcomingGoals,
    /// Index into `milestones`
    Milestone(usize),
    Ignore,
}

fn bucket_for(heading: &str) -> Bucket {
    let lower = heading.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["stack", "technolog", "dependencies"]) {
        Bucket::TechStack
    } else if has(&["convention"]) {
        Bucket::Conventions
    } else if has(&["decision"]) {
        Bucket::Decisions
    } else if has(&["lesson", "learned"]) {
        Bucket::Lessons
    } else if has(&["debt"]) {
        Bucket::TechnicalDebt
    } else if has(&["unreleased", "in progress", "active", "current"]) {
        Bucket::ActiveFeatures
    } else if has(&["upcoming", "roadmap", "next", "planned", "goal"]) {
        Bucket::UpcomingGoals
    } else {
        Bucket::Ignore
    }
}

fn decision_from(text: &str) -> Decision {
    match RATIONALE.find(text) {
        Some(m) => Decision {
            summary: text[..m.start()].trim().to_string(),
            rationale: Some(text[m.end()..].trim().to_string()).filter(|r| !r.is_empty()),
        },
        None => Decision {
            summary: text.to_string(),
            rationale: None,
        },
    }
}

/// Parse a changelog. Unrecognised content is skipped.
pub fn parse_history(text: &str) -> ProjectContext {
    let mut ctx = ProjectContext::default();
    let mut bucket = Bucket::Ignore;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(title) = trimmed.strip_prefix("# ") {
            if ctx.name.is_empty() {
                ctx.name = title.trim().to_string();
            }
            continue;
        }

        if let Some(heading) = trimmed.strip_prefix("## ") {
            let heading = heading.trim();
            bucket = match MILESTONE.captures(heading) {
                Some(caps) => {
                    let version = caps.get(1).map(|m| m.as_str().to_string());
                    let date = caps.get(2).map(|m| m.as_str().trim().to_string());
                    ctx.milestones.push(Milestone {
                        title: heading.to_string(),
                        version,
                        date,
                        highlights: Vec::new(),
                    });
                    Bucket::Milestone(ctx.milestones.len() - 1)
                }
                None => bucket_for(heading),
            };
            continue;
        }

        // `###` subsections (Added, Fixed, ...) stay in the enclosing bucket.
        if trimmed.starts_with("### ") {
            continue;
        }

        if let Some(caps) = FIELD.captures(trimmed) {
            let value = caps.get(2).map(|m| m.as_str().trim_matches('*').trim().to_string());
            let key = caps.get(1).map(|m| m.as_str().to_lowercase());
            match (key.as_deref(), value) {
                (Some("version"), Some(v)) if ctx.version.is_empty() => ctx.version = v,
                (Some("phase"), Some(v)) if ctx.phase.is_empty() => ctx.phase = v,
                _ => {}
            }
            continue;
        }

        let Some(item) = bullet_text(line) else {
            continue;
        };
        let item = item.to_string();
        match bucket {
            Bucket::TechStack => ctx.tech_stack.push(item),
            Bucket::Conventions => ctx.conventions.push(item),
            Bucket::Decisions => ctx.decisions.push(decision_from(&item)),
            Bucket::Lessons => ctx.lessons.push(item),
            Bucket::ActiveFeatures => ctx.active_features.push(item),
            Bucket::TechnicalDebt => ctx.technical_debt.push(item),
            Bucket::UpcomingGoals => ctx.upcoming_goals.push(item),
            Bucket::Milestone(idx) => {
                if let Some(milestone) = ctx.milestones.get_mut(idx) {
                    milestone.highlights.push(item);
                }
            }
            Bucket::Ignore => {}
        }
    }

    if ctx.version.is_empty() {
        if let Some(version) = ctx.milestones.iter().find_map(|m| m.version.clone()) {
            ctx.version = version;
        }
    }

    debug!(
        name = %ctx.name,
        version = %ctx.version,
        milestones = ctx.milestones.len(),
        features = ctx.active_features.len(),
        "Parsed history"
    );
    ctx
}
