//! Built-in design-system standards.
//!
//! The same lists feed two consumers: the prompt composer renders them as
//! instructions, and the task validator scores generated output against them.

use serde::{Deserialize, Serialize};

/// A usage example pairing a forbidden snippet with its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutExample {
    pub wrong: String,
    pub right: String,
}

/// The mandatory standards every generated change must follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standards {
    pub persona: String,
    pub coding_standards: Vec<String>,
    /// Raw layout markup that must go through layout components instead.
    pub forbidden_layout_patterns: Vec<String>,
    /// Layout components; at least one must appear in non-bugfix output.
    pub required_layout_components: Vec<String>,
    pub layout_examples: Vec<LayoutExample>,
    /// Hard-coded colour utilities that bypass the theme.
    pub forbidden_style_tokens: Vec<String>,
    pub required_style_tokens: Vec<String>,
    pub accessibility: Vec<String>,
    pub i18n: Vec<String>,
    pub folder_conventions: Vec<String>,
    pub output_rules: Vec<String>,
    pub validation_checklist: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Standards {
    fn default() -> Self {
        Self {
            persona: concat!(
                "You are a senior frontend engineer working inside an established ",
                "React + TypeScript codebase with a strict design system. ",
                "You write production-ready code that passes review on the first try."
            )
            .into(),
            coding_standards: strings(&[
                "Use TypeScript with explicit prop interfaces; never use `any`",
                "Write function components with named exports",
                "Keep components under 200 lines; extract subcomponents when larger",
                "Co-locate tests next to the component they cover",
                "Handle loading, empty, and error states explicitly",
            ]),
            forbidden_layout_patterns: strings(&[
                "className=\"flex",
                "className=\"grid",
                "display: flex",
                "display: grid",
            ]),
            required_layout_components: strings(&["FlexLayout", "GridLayout"]),
            layout_examples: vec![
                LayoutExample {
                    wrong: "<div className=\"flex gap-4\">".into(),
                    right: "<FlexLayout gap=\"md\">".into(),
                },
                LayoutExample {
                    wrong: "<div className=\"grid grid-cols-3\">".into(),
                    right: "<GridLayout columns={3}>".into(),
                },
            ],
            forbidden_style_tokens: strings(&[
                "bg-white",
                "bg-black",
                "text-white",
                "text-black",
                "bg-gray-",
                "text-gray-",
                "bg-blue-",
                "text-blue-",
                "#ffffff",
                "#000000",
            ]),
            required_style_tokens: strings(&[
                "bg-background",
                "text-foreground",
                "bg-primary",
                "text-muted-foreground",
                "border-border",
            ]),
            accessibility: strings(&[
                "Every interactive element is reachable and operable by keyboard",
                "Images carry meaningful `alt` text; decorative images use `alt=\"\"`",
                "Form inputs have associated labels",
                "Colour is never the only carrier of meaning",
                "Use semantic landmarks (`main`, `nav`, `header`, `footer`)",
            ]),
            i18n: strings(&[
                "Never hard-code user-facing strings; use `t('namespace.key')`",
                "Add new keys to every locale file in the same change",
                "Format dates and numbers through the i18n helpers",
            ]),
            folder_conventions: strings(&[
                "Components live in `src/components/<ComponentName>/`",
                "Pages live in `src/pages/`, features in `src/features/<feature>/`",
                "Each component folder exports through an `index.ts`",
            ]),
            output_rules: strings(&[
                "Return complete files, not fragments",
                "Prefix every file with its path as a comment",
                "Do not include explanations between files",
            ]),
            validation_checklist: strings(&[
                "No raw flex/grid classes; layout uses FlexLayout/GridLayout",
                "No hard-coded colours; only theme tokens",
                "All strings translated",
                "Accessibility requirements met",
                "Files placed according to folder conventions",
            ]),
        }
    }
}

impl Standards {
    /// Every forbidden string, layout patterns first.
    pub fn all_forbidden(&self) -> Vec<String> {
        self.forbidden_layout_patterns
            .iter()
            .chain(self.forbidden_style_tokens.iter())
            .cloned()
            .collect()
    }

    /// Every required string, layout components first.
    pub fn all_required(&self) -> Vec<String> {
        self.required_layout_components
            .iter()
            .chain(self.required_style_tokens.iter())
            .cloned()
            .collect()
    }
}
