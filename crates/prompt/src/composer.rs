//! Prompt composition.
//!
//! Sections are emitted in a fixed order and empty sections are skipped:
//!
//! 1. Persona
//! 2. Coding standards
//! 3. Layout (forbidden / required / examples)
//! 4. Styling tokens (forbidden / required)
//! 5. Accessibility
//! 6. Internationalization
//! 7. Folder and output conventions
//! 8. Validation checklist
//! 9. Extra rules
//! 10. Context block (when supplied)
//! 11. Task body
//!
//! With project rules loaded, a preface opens the prompt, the consolidated
//! pattern list follows the standard sections, and the checklist comes from
//! the rules' own checklist section when there is one.

use ctxforge_core::{ProjectRules, Standards};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Types ─────────────────────────────────────────────────────────────────

/// What the caller wants the assistant to do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRequest {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Target directory hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Pre-rendered context block, placed right before the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl PromptRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Builds prompts from the built-in standards plus optional project rules.
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    standards: Standards,
    primary_rules: Option<ProjectRules>,
    secondary_rules: Option<ProjectRules>,
    extra_rules: Vec<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn bullets(title: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let mut out = format!("## {title}\n");
    for item in items {
        out.push_str("- ");
        out.push_str(item);
        out.push('\n');
    }
    Some(out.trim_end().to_string())
}

fn checklist(title: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let lines: Vec<String> = items.iter().map(|i| format!("- [ ] {i}")).collect();
    Some(format!("## {title}\n{}", lines.join("\n")))
}

/// Append `items` to `into`, skipping anything already present.
fn merge_unique(into: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

// ── Composer ──────────────────────────────────────────────────────────────

impl PromptComposer {
    pub fn new(standards: Standards) -> Self {
        Self {
            standards,
            ..Self::default()
        }
    }

    /// Attach project rules. Empty documents are ignored.
    pub fn with_project_rules(
        mut self,
        primary: Option<ProjectRules>,
        secondary: Option<ProjectRules>,
    ) -> Self {
        self.primary_rules = primary.filter(|r| !r.is_empty());
        self.secondary_rules = secondary.filter(|r| !r.is_empty());
        self
    }

    pub fn with_extra_rules(mut self, rules: Vec<String>) -> Self {
        self.extra_rules = rules;
        self
    }

    pub fn standards(&self) -> &Standards {
        &self.standards
    }

    /// Whether any project rule text is loaded.
    pub fn is_project_mode(&self) -> bool {
        self.primary_rules.is_some() || self.secondary_rules.is_some()
    }

    fn project_rules(&self) -> impl Iterator<Item = &ProjectRules> {
        self.primary_rules.iter().chain(self.secondary_rules.iter())
    }

    /// Forbidden and required patterns from the standards and both rule
    /// sources, deduplicated with first occurrence kept.
    pub fn consolidated_patterns(&self) -> (Vec<String>, Vec<String>) {
        let mut forbidden = self.standards.all_forbidden();
        let mut required = self.standards.all_required();
        for rules in self.project_rules() {
            merge_unique(&mut forbidden, &rules.forbidden_patterns);
            merge_unique(&mut required, &rules.required_patterns);
        }
        // Deduplicate the standards' own lists too.
        let mut dedup_forbidden = Vec::with_capacity(forbidden.len());
        merge_unique(&mut dedup_forbidden, &forbidden);
        let mut dedup_required = Vec::with_capacity(required.len());
        merge_unique(&mut dedup_required, &required);
        (dedup_forbidden, dedup_required)
    }

    /// Compose the full prompt for one request.
    pub fn compose(&self, request: &PromptRequest) -> String {
        let mut sections: Vec<String> = Vec::new();
        let project_mode = self.is_project_mode();

        if project_mode {
            sections.push(self.preface());
        }

        self.push_standard_sections(&mut sections);

        if project_mode {
            let (forbidden, required) = self.consolidated_patterns();
            sections.extend(bullets("Forbidden Patterns (all sources)", &forbidden));
            sections.extend(bullets("Required Patterns (all sources)", &required));
            sections.extend(self.project_checklist());
        } else {
            sections.extend(checklist(
                "Validation Checklist",
                &self.standards.validation_checklist,
            ));
        }

        sections.extend(bullets("Additional Rules", &self.extra_rules));

        if let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) {
            sections.push(context.trim_end().to_string());
        }

        sections.push(Self::task_section(request));

        debug!(
            sections = sections.len(),
            project_mode,
            chars = sections.iter().map(String::len).sum::<usize>(),
            "Prompt composed"
        );
        sections.join("\n\n")
    }

    fn preface(&self) -> String {
        let sources: Vec<&str> = self
            .project_rules()
            .map(|r| r.source.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        let from = if sources.is_empty() {
            "the project rule files".to_string()
        } else {
            sources.join(" and ")
        };
        format!(
            "# Project Rules\nThis project defines its own rules in {from}. \
             They override general habits; where they conflict with the \
             defaults below, the project rules win."
        )
    }

    fn push_standard_sections(&self, sections: &mut Vec<String>) {
        let s = &self.standards;

        if !s.persona.trim().is_empty() {
            sections.push(format!("# Role\n{}", s.persona.trim()));
        }

        let mut standards = s.coding_standards.clone();
        for rules in self.project_rules() {
            merge_unique(&mut standards, &rules.coding_standards);
        }
        sections.extend(bullets("Coding Standards", &standards));

        sections.extend(self.layout_section());

        let mut styling = Vec::new();
        if !s.forbidden_style_tokens.is_empty() {
            styling.push(format!(
                "Forbidden tokens: {}",
                s.forbidden_style_tokens
                    .iter()
                    .map(|t| format!("`{t}`"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !s.required_style_tokens.is_empty() {
            styling.push(format!(
                "Use theme tokens instead: {}",
                s.required_style_tokens
                    .iter()
                    .map(|t| format!("`{t}`"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        sections.extend(bullets("Styling", &styling));

        sections.extend(bullets("Accessibility", &s.accessibility));
        sections.extend(bullets("Internationalization", &s.i18n));

        let mut conventions = s.folder_conventions.clone();
        conventions.extend(s.output_rules.iter().cloned());
        sections.extend(bullets("Folder & Output Conventions", &conventions));
    }

    fn layout_section(&self) -> Option<String> {
        let s = &self.standards;
        if s.forbidden_layout_patterns.is_empty()
            && s.required_layout_components.is_empty()
            && s.layout_examples.is_empty()
        {
            return None;
        }

        let mut out = String::from("## Layout\n");
        if !s.forbidden_layout_patterns.is_empty() {
            out.push_str("Never write raw layout markup:\n");
            for p in &s.forbidden_layout_patterns {
                out.push_str(&format!("- `{p}`\n"));
            }
        }
        if !s.required_layout_components.is_empty() {
            out.push_str(&format!(
                "Always compose layout with: {}\n",
                s.required_layout_components.join(", ")
            ));
        }
        for example in &s.layout_examples {
            out.push_str(&format!("- ❌ `{}`  ✅ `{}`\n", example.wrong, example.right));
        }
        Some(out.trim_end().to_string())
    }

    /// The rules' own checklist section if one exists, else the standard one.
    fn project_checklist(&self) -> Option<String> {
        let from_rules = self
            .project_rules()
            .find_map(|r| r.section_matching("checklist"))
            .filter(|(_, body)| !body.trim().is_empty());
        match from_rules {
            Some((heading, body)) => Some(format!("## {heading}\n{}", body.trim())),
            None => checklist("Validation Checklist", &self.standards.validation_checklist),
        }
    }

    fn task_section(request: &PromptRequest) -> String {
        let mut out = String::from("# Task\n");
        if let Some(component) = request.component.as_deref() {
            out.push_str(&format!("Component: {component}\n"));
        }
        if let Some(feature) = request.feature.as_deref() {
            out.push_str(&format!("Feature: {feature}\n"));
        }
        if let Some(target) = request.target.as_deref() {
            out.push_str(&format!("Target directory: {target}\n"));
        }
        if out.len() > "# Task\n".len() {
            out.push('\n');
        }
        out.push_str(request.body.trim());
        if !request.requirements.is_empty() {
            out.push_str("\n\nRequirements:");
            for req in &request.requirements {
                out.push_str("\n- ");
                out.push_str(req);
            }
        }
        out
    }
}
