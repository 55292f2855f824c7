//! Prompt Composer for ctxforge: standards, project rules, context, and the
//! task body folded into one instruction text, then wrapped for a surface.

pub mod composer;
pub mod surfaces;

pub use composer::{PromptComposer, PromptRequest};
pub use surfaces::{Surface, wrap};
