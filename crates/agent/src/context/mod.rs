//! Multi-layer context assembly.
//!
//! Five layers each offer up to three prioritised facts; the assembler
//! ranks them and packs them into a token-budgeted window.
//!
//! | Layer | Source |
//! |-------|--------|
//! | Project | Parsed changelog (overview, conventions, active features) |
//! | Session | Goals, current file, similar past tasks |
//! | Conversation | Established facts, clarified concepts, preferences |
//! | Semantic | Patterns, concepts, and knowledge from long-term memory |
//! | Temporal | Recent file changes, working pace, milestones |

pub mod assembler;
pub mod layers;
pub mod relevance;
pub mod token;
pub mod window;

pub use assembler::{AssembledContext, ContextAssembler, ContextRequest, DropInfo, LayerStats};
pub use layers::{
    ContextLayer, ConversationLayer, FileChange, PastTask, ProjectLayer, SemanticLayer,
    SessionLayer, TemporalLayer,
};
pub use window::{ContextItem, ContextWindow, InsertOutcome, LayerKind};
