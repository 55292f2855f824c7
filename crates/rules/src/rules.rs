//! Rule-document parser.
//!
//! Turns free-form Markdown rules into a [`ProjectRules`] record:
//!
//! - `## ` / `### ` headings open sections (body kept verbatim)
//! - bullets under a heading mentioning "standard" or "convention" become
//!   coding standards
//! - inline code spans under forbidden/never/avoid/don't headings become
//!   forbidden patterns; under required/must/always/use headings they become
//!   required patterns
//! - `❌` / `✅` lines contribute their code spans in any section
//!
//! Parsing is best-effort: nothing here can fail.

use ctxforge_core::ProjectRules;
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::debug;

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("Invalid code span regex"));

const FORBIDDEN_MARKERS: &[&str] = &["forbidden", "never", "avoid", "don't", "dont", "do not"];
const REQUIRED_MARKERS: &[&str] = &["required", "must", "always"];
const STANDARD_MARKERS: &[&str] = &["standard", "convention"];

/// How a section's code spans are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Forbidden,
    Required,
    Neutral,
}

#[derive(Debug, Default)]
struct Section {
    heading: String,
    body: Vec<String>,
}

fn polarity_of(heading: &str) -> Polarity {
    let lower = heading.to_lowercase();
    if FORBIDDEN_MARKERS.iter().any(|m| lower.contains(m)) {
        return Polarity::Forbidden;
    }
    let mentions_use = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "use");
    if mentions_use || REQUIRED_MARKERS.iter().any(|m| lower.contains(m)) {
        Polarity::Required
    } else {
        Polarity::Neutral
    }
}

fn is_standards_heading(heading: &str) -> bool {
    let lower = heading.to_lowercase();
    STANDARD_MARKERS.iter().any(|m| lower.contains(m))
}

/// Text of a list item, or `None` if the line is not one.
pub(crate) fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
        .or_else(|| {
            let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
            if digits == 0 {
                return None;
            }
            trimmed[digits..].strip_prefix(". ")
        })?;
    let rest = rest
        .strip_prefix("[ ] ")
        .or_else(|| rest.strip_prefix("[x] "))
        .or_else(|| rest.strip_prefix("[X] "))
        .unwrap_or(rest)
        .trim();
    (!rest.is_empty()).then_some(rest)
}

/// Heading text for `## ` and `### ` lines.
fn section_heading(line: &str) -> Option<&str> {
    line.strip_prefix("### ")
        .or_else(|| line.strip_prefix("## "))
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

fn code_spans(line: &str) -> impl Iterator<Item = &str> {
    CODE_SPAN
        .captures_iter(line)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Parse one rule document. `source` labels where it came from.
pub fn parse_rules(source: &str, text: &str) -> ProjectRules {
    let mut rules = ProjectRules {
        source: source.to_string(),
        raw: text.to_string(),
        ..ProjectRules::default()
    };

    let mut sections: Vec<Section> = Vec::new();
    let mut polarity = Polarity::Neutral;
    let mut standards = false;

    for line in text.lines() {
        if let Some(heading) = section_heading(line) {
            polarity = polarity_of(heading);
            standards = is_standards_heading(heading);
            sections.push(Section {
                heading: heading.to_string(),
                body: Vec::new(),
            });
            continue;
        }

        if let Some(section) = sections.last_mut() {
            section.body.push(line.to_string());
        }

        let content = bullet_text(line).unwrap_or(line.trim());
        let line_polarity = if content.starts_with('❌') {
            Polarity::Forbidden
        } else if content.starts_with('✅') {
            Polarity::Required
        } else {
            polarity
        };

        match line_polarity {
            Polarity::Forbidden => {
                for span in code_spans(line) {
                    push_unique(&mut rules.forbidden_patterns, span);
                }
            }
            Polarity::Required => {
                for span in code_spans(line) {
                    push_unique(&mut rules.required_patterns, span);
                }
            }
            Polarity::Neutral => {}
        }

        if standards {
            if let Some(item) = bullet_text(line) {
                push_unique(&mut rules.coding_standards, item);
            }
        }
    }

    for section in sections {
        let body = section.body.join("\n").trim().to_string();
        // A repeated heading keeps the first body.
        rules.sections.entry(section.heading).or_insert(body);
    }

    debug!(
        source,
        sections = rules.sections.len(),
        standards = rules.coding_standards.len(),
        forbidden = rules.forbidden_patterns.len(),
        required = rules.required_patterns.len(),
        "Parsed rules"
    );
    rules
}
