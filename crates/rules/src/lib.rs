//! Parsers for the two project sources ctxforge consumes: rule documents
//! (forbidden/required patterns, named sections) and the changelog.

pub mod history;
pub mod loader;
pub mod rules;

pub use history::parse_history;
pub use loader::{SourceDocuments, load_history, load_rules, load_sources};
pub use rules::parse_rules;
