//! Conversation tracking: mood, momentum, topics, and sentiment.

pub mod analysis;
pub mod tracker;

pub use analysis::{Mood, MoodSignals, Sentiment, analyze_sentiment, determine_mood, extract_topics};
pub use tracker::{ConversationState, ConversationSummary, ConversationTracker};
