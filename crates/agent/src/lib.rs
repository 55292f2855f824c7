//! The ctxforge runtime: context assembly, conversation tracking, and the
//! [`Engine`] that ties them to memory, tasks, and prompt composition.
//!
//! A prompt request flows through the engine like this:
//!
//! 1. **Track** the user message (topics, sentiment, mood)
//! 2. **Assemble context** from the five layers within the token budget
//! 3. **Compose** the prompt with standards, project rules, and the active
//!    task's requirements
//! 4. **Wrap** it for the target surface
//! 5. **Record** the interaction in episodic memory

pub mod context;
pub mod conversation;
pub mod engine;

pub use context::{
    AssembledContext, ContextAssembler, ContextItem, ContextLayer, ContextRequest, ContextWindow,
    DropInfo, InsertOutcome, LayerKind, LayerStats,
};
pub use conversation::{ConversationState, ConversationSummary, ConversationTracker, Mood, Sentiment};
pub use engine::{Engine, PromptOutcome};
