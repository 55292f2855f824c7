//! Conversation state: messages, topics, mood, and momentum.

use crate::context::token;
use crate::conversation::analysis::{self, Mood, MoodSignals, Sentiment};
use chrono::{DateTime, Utc};
use ctxforge_core::{Clock, IdGenerator, Message, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const MAX_MOMENTUM: u8 = 100;

/// Live state of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: String,
    /// Every message of the conversation, oldest first.
    pub messages: Vec<Message>,
    /// Distinct topics, in first-seen order.
    pub topics: Vec<String>,
    pub established: Vec<String>,
    pub clarified: Vec<String>,
    pub preferences: BTreeMap<String, String>,
    pub mood: Mood,
    pub momentum: u8,
    pub last_sentiment: Sentiment,
    pub started_at: DateTime<Utc>,
}

impl ConversationState {
    /// The most recent `window` messages.
    pub fn recent(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    pub fn total_tokens(&self) -> usize {
        token::messages_tokens(&self.messages)
    }
}

/// Archived record of a finished conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub message_count: usize,
    pub total_tokens: usize,
    pub topics: Vec<String>,
    pub final_mood: Mood,
    pub final_momentum: u8,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

pub struct ConversationTracker {
    current: Option<ConversationState>,
    archive: Vec<ConversationSummary>,
    recent_window: usize,
    initial_momentum: u8,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ConversationTracker {
    pub fn new(
        recent_window: usize,
        initial_momentum: u8,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            current: None,
            archive: Vec::new(),
            recent_window: recent_window.max(1),
            initial_momentum: initial_momentum.min(MAX_MOMENTUM),
            clock,
            ids,
        }
    }

    pub fn recent_window(&self) -> usize {
        self.recent_window
    }

    pub fn state(&self) -> Option<&ConversationState> {
        self.current.as_ref()
    }

    pub fn archive(&self) -> &[ConversationSummary] {
        &self.archive
    }

    /// Current mood, collaborative when no conversation is open.
    pub fn mood(&self) -> Mood {
        self.current.as_ref().map(|s| s.mood).unwrap_or_default()
    }

    pub fn momentum(&self) -> u8 {
        self.current
            .as_ref()
            .map_or(self.initial_momentum, |s| s.momentum)
    }

    /// Open a new conversation, archiving any open one first.
    pub fn start(&mut self) -> String {
        if self.current.is_some() {
            self.end_conversation();
        }
        let state = open_state(self.clock.as_ref(), self.ids.as_ref(), self.initial_momentum);
        let id = state.id.clone();
        self.current = Some(state);
        id
    }

    // Opens a conversation on first use.
    fn state_mut(&mut self) -> &mut ConversationState {
        let Self {
            current,
            clock,
            ids,
            initial_momentum,
            ..
        } = self;
        current.get_or_insert_with(|| open_state(clock.as_ref(), ids.as_ref(), *initial_momentum))
    }

    /// Record a message; user messages update topics, sentiment, and mood.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) -> &Message {
        let content = content.into();
        let id = self.ids.next_id("msg");
        let now = self.clock.now();
        let window = self.recent_window;
        let state = self.state_mut();

        let tokens = token::estimate_tokens(&content);
        let message = Message::new(id, role, content, tokens, now);
        let is_user = message.is_user();
        if is_user {
            for topic in analysis::extract_topics(&message.content) {
                if !state.topics.iter().any(|t| t == topic) {
                    state.topics.push(topic.to_string());
                }
            }
            state.last_sentiment = analysis::analyze_sentiment(&message.content);
        }
        state.messages.push(message);

        if is_user {
            let user_messages = state.recent(window).iter().filter(|m| m.is_user()).count();
            let next = analysis::determine_mood(MoodSignals {
                sentiment: state.last_sentiment,
                distinct_topics: state.topics.len(),
                momentum: state.momentum,
                engagement: analysis::user_engagement(user_messages),
            });
            if next != state.mood {
                debug!(conversation = %state.id, from = %state.mood, to = %next, "Mood changed");
                state.mood = next;
            }
        }

        let last = state.messages.len() - 1;
        &state.messages[last]
    }

    /// Shift momentum by `delta`, clamped to 0–100. Returns the new value.
    pub fn adjust_momentum(&mut self, delta: i32) -> u8 {
        let state = self.state_mut();
        let next = (i32::from(state.momentum) + delta).clamp(0, i32::from(MAX_MOMENTUM));
        state.momentum = next as u8;
        debug!(conversation = %state.id, delta, momentum = state.momentum, "Momentum adjusted");
        state.momentum
    }

    /// Returns `false` if the fact was already established.
    pub fn establish_fact(&mut self, fact: impl Into<String>) -> bool {
        push_unique(&mut self.state_mut().established, fact.into())
    }

    /// Returns `false` if the concept was already clarified.
    pub fn clarify_concept(&mut self, concept: impl Into<String>) -> bool {
        push_unique(&mut self.state_mut().clarified, concept.into())
    }

    /// Set or overwrite a preference.
    pub fn set_preference(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.state_mut().preferences.insert(key.into(), value.into());
    }

    /// Close the open conversation and archive its summary.
    pub fn end_conversation(&mut self) -> Option<ConversationSummary> {
        let state = self.current.take()?;
        let summary = ConversationSummary {
            message_count: state.messages.len(),
            total_tokens: state.total_tokens(),
            topics: state.topics.clone(),
            final_mood: state.mood,
            final_momentum: state.momentum,
            started_at: state.started_at,
            ended_at: self.clock.now(),
            id: state.id,
        };
        info!(
            conversation = %summary.id,
            messages = summary.message_count,
            mood = %summary.final_mood,
            momentum = summary.final_momentum,
            "Conversation ended"
        );
        self.archive.push(summary.clone());
        Some(summary)
    }
}

fn open_state(clock: &dyn Clock, ids: &dyn IdGenerator, momentum: u8) -> ConversationState {
    let id = ids.next_id("conv");
    info!(conversation = %id, momentum, "Conversation started");
    ConversationState {
        id,
        messages: Vec::new(),
        topics: Vec::new(),
        established: Vec::new(),
        clarified: Vec::new(),
        preferences: BTreeMap::new(),
        mood: Mood::default(),
        momentum,
        last_sentiment: Sentiment::Neutral,
        started_at: clock.now(),
    }
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    let value = value.trim().to_string();
    if value.is_empty() || list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ctxforge_core::{ManualClock, SequentialIds};

    fn tracker(initial_momentum: u8) -> (ConversationTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let t = ConversationTracker::new(20, initial_momentum, clock.clone(), Arc::new(SequentialIds::new()));
        (t, clock)
    }

    #[test]
    fn error_message_at_low_momentum_means_debugging() {
        let (mut t, _) = tracker(20);
        t.add_message(Role::User, "I keep getting an error on save");
        assert_eq!(t.mood(), Mood::Debugging);
    }

    #[test]
    fn neutral_start_is_collaborative() {
        let (mut t, _) = tracker(50);
        t.add_message(Role::User, "Let's build a pricing card");
        assert_eq!(t.mood(), Mood::Collaborative);
        assert_eq!(t.momentum(), 50);
    }

    #[test]
    fn many_topics_become_exploratory() {
        let (mut t, _) = tracker(50);
        t.add_message(Role::User, "component layout and style");
        t.add_message(Role::User, "what about theme, color and animation?");
        assert_eq!(t.state().unwrap().topics.len(), 6);
        assert_eq!(t.mood(), Mood::Exploratory);
    }

    #[test]
    fn sustained_engagement_and_momentum_become_focused() {
        let (mut t, _) = tracker(80);
        for n in 0..6 {
            t.add_message(Role::User, format!("next step {n}"));
        }
        // 6 × 15 = 90 engagement
        assert_eq!(t.mood(), Mood::Focused);
    }

    #[test]
    fn positive_feedback_with_momentum_is_learning() {
        let (mut t, _) = tracker(65);
        t.add_message(Role::User, "Thanks, that makes it clear");
        assert_eq!(t.mood(), Mood::Learning);
    }

    #[test]
    fn assistant_messages_do_not_recompute_mood() {
        let (mut t, _) = tracker(50);
        t.add_message(Role::User, "hello");
        t.add_message(Role::Assistant, "error error error");
        assert_eq!(t.mood(), Mood::Collaborative);
        assert!(t.state().unwrap().topics.is_empty());
    }

    #[test]
    fn momentum_is_clamped() {
        let (mut t, _) = tracker(95);
        assert_eq!(t.adjust_momentum(10), 100);
        assert_eq!(t.adjust_momentum(-250), 0);
        assert_eq!(t.adjust_momentum(-10), 0);
    }

    #[test]
    fn message_tokens_are_char_based() {
        let (mut t, _) = tracker(50);
        let msg = t.add_message(Role::User, "hello");
        assert_eq!(msg.tokens, 2);
    }

    #[test]
    fn recent_view_is_bounded() {
        let clock = Arc::new(ManualClock::default());
        let mut t = ConversationTracker::new(3, 50, clock, Arc::new(SequentialIds::new()));
        for n in 0..5 {
            t.add_message(Role::User, format!("m{n}"));
        }
        let state = t.state().unwrap();
        assert_eq!(state.messages.len(), 5);
        let recent: Vec<&str> = state.recent(3).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(recent, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn facts_and_preferences_deduplicate() {
        let (mut t, _) = tracker(50);
        assert!(t.establish_fact("Use GridLayout for cards"));
        assert!(!t.establish_fact("Use GridLayout for cards"));
        assert!(t.clarify_concept("design tokens"));
        assert!(!t.clarify_concept(" design tokens "));
        t.set_preference("tone", "terse");
        t.set_preference("tone", "friendly");
        let state = t.state().unwrap();
        assert_eq!(state.established.len(), 1);
        assert_eq!(state.clarified.len(), 1);
        assert_eq!(state.preferences.get("tone").map(String::as_str), Some("friendly"));
    }

    #[test]
    fn end_conversation_archives_a_summary() {
        let (mut t, clock) = tracker(50);
        t.start();
        t.add_message(Role::User, "fix the layout bug");
        t.add_message(Role::Assistant, "done");
        t.adjust_momentum(10);
        clock.advance(Duration::minutes(5));

        let summary = t.end_conversation().unwrap();
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.total_tokens, 5 + 1);
        assert_eq!(summary.topics, vec!["layout", "bug"]);
        assert_eq!(summary.final_momentum, 60);
        assert_eq!(summary.ended_at - summary.started_at, Duration::minutes(5));
        assert!(t.state().is_none());
        assert_eq!(t.archive().len(), 1);
        assert!(t.end_conversation().is_none());
    }

    #[test]
    fn starting_again_archives_the_open_conversation() {
        let (mut t, _) = tracker(50);
        let first = t.start();
        let second = t.start();
        assert_ne!(first, second);
        assert_eq!(t.archive()[0].id, first);
    }
}
