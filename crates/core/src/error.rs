//! Error types for the ctxforge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Missing data sources are
//! never errors (they surface as warnings); these types cover caller
//! mistakes and injected-collaborator failures.

use thiserror::Error;

/// The top-level error type for all ctxforge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Task errors ---
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Snapshot '{tier}' is invalid: {reason}")]
    Snapshot { tier: String, reason: String },

    #[error("Memory item not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("Task field '{field}' must not be empty")]
    MissingField { field: &'static str },

    #[error("Task storage error: {0}")]
    Storage(String),
}

/// Failure reported by an injected task executor.
///
/// The task manager converts this into a failed task result; it never
/// propagates past the manager.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("Executor failed: {0}")]
    Failed(String),

    #[error("Executor unavailable: {0}")]
    Unavailable(String),
}
