//! Keyword gating for task-sensitive context.

use ctxforge_core::TaskKind;

/// Keywords that mark text as relevant to a task kind.
pub fn keywords_for(kind: TaskKind) -> &'static [&'static str] {
    match kind {
        TaskKind::CreateComponent => &["component", "props", "layout", "reusable"],
        TaskKind::CreatePage => &["page", "route", "layout", "navigation"],
        TaskKind::CreateFeature => &["feature", "module", "flow", "state"],
        TaskKind::UpdateStyles => &["style", "design", "token", "theme"],
        TaskKind::FixBug => &["bug", "error", "fix", "regression"],
        TaskKind::Refactor => &["refactor", "structure", "clean", "extract"],
        TaskKind::AddTests => &["test", "coverage", "assert", "mock"],
        TaskKind::AddTranslations => &["translation", "i18n", "locale", "string"],
        TaskKind::ImproveAccessibility => &["accessibility", "a11y", "aria", "keyboard"],
    }
}

/// Whether `text` mentions at least one keyword for `kind`.
/// With no kind, everything is relevant.
pub fn is_relevant(text: &str, kind: Option<TaskKind>) -> bool {
    let Some(kind) = kind else {
        return true;
    };
    let lower = text.to_lowercase();
    keywords_for(kind).iter().any(|k| lower.contains(k))
}

/// The first task kind whose keywords appear in `text`, in declaration order.
pub fn infer_kind(text: &str) -> Option<TaskKind> {
    let lower = text.to_lowercase();
    TaskKind::ALL
        .into_iter()
        .find(|kind| keywords_for(*kind).iter().any(|k| lower.contains(k)))
}
