//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! Counting characters rather than bytes keeps non-ASCII text from being
//! overcharged.

use ctxforge_core::Message;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Total recorded token cost of a slice of messages.
pub fn messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.tokens).sum()
}
