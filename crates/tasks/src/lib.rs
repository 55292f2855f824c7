//! Task Lifecycle Manager for ctxforge.
//!
//! ```text
//! create ──▶ pending ──execute──▶ in_progress ──▶ completed (scored)
//!                                      └────────▶ failed (executor error)
//! ```

pub mod executor;
pub mod manager;
pub mod templates;
pub mod validator;

pub use executor::{FnExecutor, TaskExecutor};
pub use manager::{NewTask, TaskManager};
pub use templates::{Template, render_instructions, template};
pub use validator::{ValidationReport, Violation, validate_output};
