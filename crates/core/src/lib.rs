//! # ctxforge Core
//!
//! Domain records, seams, and error definitions shared by every ctxforge
//! crate. This crate carries no I/O: it defines the model that the memory
//! store, the task manager, the prompt composer, and the engine implement
//! against.
//!
//! ## Seams
//!
//! Time and identity are injected rather than read globally:
//! - [`Clock`] returns "now" (`SystemClock` in production, `ManualClock` in tests)
//! - [`IdGenerator`] mints identifiers (`UuidGenerator`, `SequentialIds`)

pub mod clock;
pub mod error;
pub mod id;
pub mod memory;
pub mod message;
pub mod project;
pub mod standards;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, ExecutorError, MemoryError, Result, TaskError};
pub use id::{IdGenerator, SequentialIds, UuidGenerator};
pub use memory::{MemoryItem, MemoryKind};
pub use message::{Message, Role};
pub use project::{ProjectContext, ProjectRules};
pub use standards::Standards;
pub use task::{Task, TaskContext, TaskKind, TaskPriority, TaskResult, TaskStatus};
