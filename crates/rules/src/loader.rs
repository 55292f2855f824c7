//! Async loading of the rule documents and the changelog.
//!
//! A missing or unreadable source is never an error: the caller gets
//! defaults plus a warning describing what was skipped.

use crate::history::parse_history;
use crate::rules::parse_rules;
use ctxforge_core::{ProjectContext, ProjectRules};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything read from the project's source documents.
#[derive(Debug, Clone, Default)]
pub struct SourceDocuments {
    /// One entry per rule file that could be read, in configured order.
    pub rules: Vec<ProjectRules>,
    pub history: ProjectContext,
    pub warnings: Vec<String>,
}

impl SourceDocuments {
    pub fn primary_rules(&self) -> Option<&ProjectRules> {
        self.rules.first()
    }

    pub fn secondary_rules(&self) -> Option<&ProjectRules> {
        self.rules.get(1)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Read a text file, mapping any failure to a warning.
async fn read_source(path: &Path, what: &str) -> Result<String, String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "{what} not found, using defaults");
            Err(format!("{what} not found at {}", path.display()))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "{what} unreadable, using defaults");
            Err(format!("Could not read {what} at {}: {e}", path.display()))
        }
    }
}

/// Load and parse one rule document.
pub async fn load_rules(path: &Path) -> Result<ProjectRules, String> {
    let text = read_source(path, "Rules file").await?;
    Ok(parse_rules(&path.display().to_string(), &text))
}

/// Load and parse the changelog.
pub async fn load_history(path: &Path) -> Result<ProjectContext, String> {
    let text = read_source(path, "History file").await?;
    Ok(parse_history(&text))
}

/// Load every configured source, resolving relative paths against `root`.
pub async fn load_sources(root: &Path, rules_files: &[PathBuf], history_file: &Path) -> SourceDocuments {
    let mut docs = SourceDocuments::default();

    for file in rules_files {
        match load_rules(&resolve(root, file)).await {
            Ok(rules) => docs.rules.push(rules),
            Err(warning) => docs.warnings.push(warning),
        }
    }

    match load_history(&resolve(root, history_file)).await {
        Ok(history) => docs.history = history,
        Err(warning) => docs.warnings.push(warning),
    }

    info!(
        rules = docs.rules.len(),
        project = %docs.history.name,
        warnings = docs.warnings.len(),
        "Project sources loaded"
    );
    docs
}
