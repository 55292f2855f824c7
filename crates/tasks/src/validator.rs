//! Scores generated output against the standards.
//!
//! Start at 100, then:
//! - −10 per occurrence of a forbidden layout pattern
//! - −5 per occurrence of a forbidden style token
//! - −20 when a non-bugfix output uses none of the required layout components
//!
//! The score never drops below 0.

use ctxforge_core::{Standards, TaskKind};
use serde::{Deserialize, Serialize};

pub const PERFECT_SCORE: u8 = 100;
pub const LAYOUT_PENALTY: u32 = 10;
pub const STYLE_PENALTY: u32 = 5;
pub const MISSING_LAYOUT_PENALTY: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub pattern: String,
    pub occurrences: usize,
    /// Total points deducted for this pattern.
    pub penalty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub score: u8,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn passed(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}

fn count_violations(
    text: &str,
    patterns: &[String],
    per_hit: u32,
    label: &str,
    report: &mut ValidationReport,
) -> u32 {
    let mut total = 0u32;
    for pattern in patterns.iter().filter(|p| !p.is_empty()) {
        let occurrences = text.matches(pattern.as_str()).count();
        if occurrences == 0 {
            continue;
        }
        let penalty = per_hit.saturating_mul(u32::try_from(occurrences).unwrap_or(u32::MAX));
        total = total.saturating_add(penalty);
        report
            .warnings
            .push(format!("{label} `{pattern}` used {occurrences} time(s) (-{penalty})"));
        report.violations.push(Violation {
            pattern: pattern.clone(),
            occurrences,
            penalty,
        });
    }
    total
}

/// Score `text` for a task of `kind`.
pub fn validate_output(text: &str, kind: TaskKind, standards: &Standards) -> ValidationReport {
    let mut report = ValidationReport {
        score: PERFECT_SCORE,
        violations: Vec::new(),
        warnings: Vec::new(),
    };

    let mut deducted = count_violations(
        text,
        &standards.forbidden_layout_patterns,
        LAYOUT_PENALTY,
        "Forbidden layout pattern",
        &mut report,
    );
    deducted = deducted.saturating_add(count_violations(
        text,
        &standards.forbidden_style_tokens,
        STYLE_PENALTY,
        "Forbidden style token",
        &mut report,
    ));

    let has_layout = standards
        .required_layout_components
        .iter()
        .any(|c| text.contains(c.as_str()));
    if !kind.is_bug_fix() && !standards.required_layout_components.is_empty() && !has_layout {
        deducted = deducted.saturating_add(MISSING_LAYOUT_PENALTY);
        let components = standards.required_layout_components.join(" or ");
        report.warnings.push(format!(
            "No required layout component used; expected {components} (-{MISSING_LAYOUT_PENALTY})"
        ));
        report.violations.push(Violation {
            pattern: components,
            occurrences: 0,
            penalty: MISSING_LAYOUT_PENALTY,
        });
    }

    report.score = u32::from(PERFECT_SCORE).saturating_sub(deducted) as u8;
    report
}
