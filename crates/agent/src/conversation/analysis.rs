//! Topic, sentiment, and mood heuristics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Topics recognised by case-insensitive substring match.
pub const TOPIC_KEYWORDS: &[&str] = &[
    "component",
    "page",
    "layout",
    "style",
    "theme",
    "color",
    "test",
    "bug",
    "error",
    "performance",
    "accessibility",
    "translation",
    "api",
    "state",
    "form",
    "navigation",
    "animation",
    "responsive",
    "refactor",
    "deploy",
];

/// Word prefixes counted as positive.
const POSITIVE: &[&str] = &[
    "great", "good", "thank", "perfect", "awesome", "love", "nice", "works", "excellent",
    "helpful", "clear", "yes",
];

/// Word prefixes counted as negative.
const NEGATIVE: &[&str] = &[
    "error", "bug", "broke", "fail", "wrong", "issue", "problem", "crash", "bad", "confus",
    "stuck", "hate",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Collaborative,
    Focused,
    Exploratory,
    Debugging,
    Learning,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collaborative => "collaborative",
            Self::Focused => "focused",
            Self::Exploratory => "exploratory",
            Self::Debugging => "debugging",
            Self::Learning => "learning",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topics mentioned in `text`, in keyword-list order.
pub fn extract_topics(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .copied()
        .filter(|k| lower.contains(k))
        .collect()
}

/// Net sign of positive minus negative words; a tie is neutral.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let mut score = 0i32;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
    {
        if POSITIVE.iter().any(|p| word.starts_with(p)) {
            score += 1;
        }
        if NEGATIVE.iter().any(|n| word.starts_with(n)) {
            score -= 1;
        }
    }
    match score.signum() {
        1 => Sentiment::Positive,
        -1 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// 15 points per user message in the active view, capped at 100.
pub fn user_engagement(user_messages: usize) -> u8 {
    user_messages.saturating_mul(15).min(100) as u8
}

/// Inputs to [`determine_mood`].
#[derive(Debug, Clone, Copy)]
pub struct MoodSignals {
    pub sentiment: Sentiment,
    pub distinct_topics: usize,
    pub momentum: u8,
    pub engagement: u8,
}

/// First matching rule wins.
pub fn determine_mood(signals: MoodSignals) -> Mood {
    if signals.sentiment == Sentiment::Negative || signals.momentum < 30 {
        Mood::Debugging
    } else if signals.engagement > 80 && signals.momentum > 70 {
        Mood::Focused
    } else if signals.distinct_topics > 5 {
        Mood::Exploratory
    } else if signals.sentiment == Sentiment::Positive && signals.momentum > 60 {
        Mood::Learning
    } else {
        Mood::Collaborative
    }
}
