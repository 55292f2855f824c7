//! Four-tier memory for ctxforge.
//!
//! - [`WorkingMemory`]: small, recency-evicted, decaying
//! - [`EpisodicMemory`]: sessions, interactions, outcomes (append-only)
//! - [`SemanticMemory`]: concepts, relationships, patterns, knowledge
//! - [`ProceduralMemory`]: workflows, procedures, skills, shortcuts
//!
//! [`MemoryStore`] ties them together and persists each tier through a
//! [`SnapshotStore`].

pub mod decay;
pub mod episodic;
pub mod file_backend;
pub mod in_memory;
pub mod procedural;
pub mod semantic;
pub mod snapshot;
pub mod store;
pub mod working;

pub use decay::{DecayPolicy, DecayVerdict};
pub use episodic::{EpisodicMemory, Interaction, Outcome, Session};
pub use file_backend::FileSnapshots;
pub use in_memory::InMemorySnapshots;
pub use procedural::{ProceduralMemory, Procedure, Shortcut, Skill, Workflow};
pub use semantic::{Concept, KnowledgeFact, Pattern, Relationship, SemanticMemory};
pub use snapshot::{SnapshotStore, Tier};
pub use store::{MemoryStore, SearchHit, SearchQuery};
pub use working::{DecayReport, WorkingMemory, WorkingSnapshot};
