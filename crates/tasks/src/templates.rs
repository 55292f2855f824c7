//! One fixed instruction template per task kind.

use ctxforge_core::{Task, TaskKind};

/// Instruction block for a task kind.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub heading: &'static str,
    pub steps: &'static [&'static str],
}

const CREATE_COMPONENT: Template = Template {
    heading: "Create a new component",
    steps: &[
        "Create the folder `src/components/<ComponentName>/`",
        "Define a typed props interface and export it",
        "Build the markup with FlexLayout/GridLayout for every layout concern",
        "Style exclusively with theme tokens (bg-background, text-foreground, ...)",
        "Route every user-facing string through `t()` and add the keys to each locale",
        "Add keyboard support, labels, and ARIA attributes where needed",
        "Export the component from `index.ts`",
        "Write a co-located test covering rendering and interaction",
    ],
};

const CREATE_PAGE: Template = Template {
    heading: "Create a new page",
    steps: &[
        "Add the page under `src/pages/` and register its route",
        "Compose the page from existing components before writing new ones",
        "Use a single `main` landmark and a logical heading order",
        "Handle loading, empty, and error states",
    ],
};

const CREATE_FEATURE: Template = Template {
    heading: "Create a new feature",
    steps: &[
        "Place feature code in `src/features/<feature>/`",
        "Separate data access (hooks) from presentation (components)",
        "Expose a single public entry point from the feature folder",
        "Cover the main user flow with tests",
    ],
};

const UPDATE_STYLES: Template = Template {
    heading: "Update styles",
    steps: &[
        "Replace hard-coded colours with theme tokens",
        "Replace raw flex/grid classes with FlexLayout/GridLayout",
        "Keep visual changes scoped to the listed files",
    ],
};

const FIX_BUG: Template = Template {
    heading: "Fix a bug",
    steps: &[
        "Reproduce the bug and state the root cause",
        "Make the smallest change that fixes the cause, not the symptom",
        "Add a regression test",
    ],
};

const REFACTOR: Template = Template {
    heading: "Refactor",
    steps: &[
        "Preserve behaviour exactly; no functional changes",
        "Extract repeated markup into components",
        "Bring touched code in line with the layout and styling rules",
    ],
};

const ADD_TESTS: Template = Template {
    heading: "Add tests",
    steps: &[
        "Test behaviour through the public interface, not implementation details",
        "Cover the happy path, edge cases, and error states",
        "Query elements by role or label text",
    ],
};

const ADD_TRANSLATIONS: Template = Template {
    heading: "Add translations",
    steps: &[
        "Extract every hard-coded user-facing string into translation keys",
        "Add each key to every locale file",
        "Use interpolation instead of string concatenation",
    ],
};

const IMPROVE_ACCESSIBILITY: Template = Template {
    heading: "Improve accessibility",
    steps: &[
        "Make every interactive element keyboard reachable with visible focus",
        "Add labels, alt text, and ARIA attributes where semantics are missing",
        "Check colour contrast against the theme tokens",
    ],
};

pub fn template(kind: TaskKind) -> Template {
    match kind {
        TaskKind::CreateComponent => CREATE_COMPONENT,
        TaskKind::CreatePage => CREATE_PAGE,
        TaskKind::CreateFeature => CREATE_FEATURE,
        TaskKind::UpdateStyles => UPDATE_STYLES,
        TaskKind::FixBug => FIX_BUG,
        TaskKind::Refactor => REFACTOR,
        TaskKind::AddTests => ADD_TESTS,
        TaskKind::AddTranslations => ADD_TRANSLATIONS,
        TaskKind::ImproveAccessibility => IMPROVE_ACCESSIBILITY,
    }
}

/// Title, description, numbered steps, and affected files for `task`.
/// Requirements are left to the composer, which lists them after the body.
pub fn render_instructions(task: &Task) -> String {
    let tpl = template(task.kind);
    let mut out = format!("{}: {}\n", tpl.heading, task.title);
    if !task.description.trim().is_empty() {
        out.push_str(task.description.trim());
        out.push('\n');
    }
    out.push_str("\nSteps:\n");
    for (n, step) in tpl.steps.iter().enumerate() {
        out.push_str(&format!("{}. {step}\n", n + 1));
    }
    if !task.context.affected_files.is_empty() {
        out.push_str("\nAffected files:\n");
        for file in &task.context.affected_files {
            out.push_str(&format!("- {file}\n"));
        }
    }
    out.trim_end().to_string()
}
