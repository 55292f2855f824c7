//! Episodic memory: append-only record of sessions, interactions, and
//! outcomes. Nothing here is ever evicted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One episodic unit of engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub goals: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Satisfaction in [0, 100], set when the session closes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<f64>,
    #[serde(default)]
    pub lessons: Vec<String>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// One request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub output: String,
    pub success: bool,
    pub token_cost: usize,
}

/// The observed outcome of a piece of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub description: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodicMemory {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

impl EpisodicMemory {
    pub fn start_session(&mut self, session: Session) {
        self.sessions.push(session);
    }

    /// Close an open session. Returns `false` for unknown or closed sessions.
    pub fn end_session(
        &mut self,
        id: &str,
        satisfaction: f64,
        lessons: Vec<String>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id && s.is_open()) {
            Some(session) => {
                session.ended_at = Some(now);
                session.satisfaction = Some(satisfaction.clamp(0.0, 100.0));
                session.lessons = lessons;
                true
            }
            None => false,
        }
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn record_interaction(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// The newest `n` interactions, oldest first.
    pub fn recent_interactions(&self, n: usize) -> &[Interaction] {
        let start = self.interactions.len().saturating_sub(n);
        &self.interactions[start..]
    }

    pub fn interactions_for(&self, session_id: &str) -> impl Iterator<Item = &Interaction> {
        self.interactions
            .iter()
            .filter(move |i| i.session_id == session_id)
    }

    /// Share of successful outcomes in [0, 1], `None` when nothing was recorded.
    pub fn success_rate(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let ok = self.outcomes.iter().filter(|o| o.success).count();
        Some(ok as f64 / self.outcomes.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> Session {
        Session {
            id: id.into(),
            user: "dev".into(),
            goals: vec!["ship the header".into()],
            started_at: Utc::now(),
            ended_at: None,
            satisfaction: None,
            lessons: vec![],
        }
    }

    fn interaction(session_id: &str, input: &str) -> Interaction {
        Interaction {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            input: input.into(),
            output: String::new(),
            success: true,
            token_cost: 3,
        }
    }

    #[test]
    fn session_lifecycle() {
        let mut ep = EpisodicMemory::default();
        ep.start_session(session("s1"));
        assert!(ep.session("s1").unwrap().is_open());

        assert!(ep.end_session("s1", 140.0, vec!["keep prompts short".into()], Utc::now()));
        let s = ep.session("s1").unwrap();
        assert!(!s.is_open());
        assert_eq!(s.satisfaction, Some(100.0));
        assert_eq!(s.lessons.len(), 1);

        // Closing twice is refused.
        assert!(!ep.end_session("s1", 50.0, vec![], Utc::now()));
    }

    #[test]
    fn recent_interactions_returns_tail() {
        let mut ep = EpisodicMemory::default();
        for n in 0..5 {
            ep.record_interaction(interaction("s1", &format!("q{n}")));
        }
        let recent = ep.recent_interactions(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].input, "q3");
        assert_eq!(ep.recent_interactions(50).len(), 5);
    }

    #[test]
    fn interactions_filter_by_session() {
        let mut ep = EpisodicMemory::default();
        ep.record_interaction(interaction("s1", "a"));
        ep.record_interaction(interaction("s2", "b"));
        ep.record_interaction(interaction("s1", "c"));
        assert_eq!(ep.interactions_for("s1").count(), 2);
    }

    #[test]
    fn success_rate_over_outcomes() {
        let mut ep = EpisodicMemory::default();
        assert!(ep.success_rate().is_none());
        for success in [true, true, false, true] {
            ep.record_outcome(Outcome {
                session_id: "s1".into(),
                task_id: None,
                description: "x".into(),
                success,
                score: None,
                timestamp: Utc::now(),
            });
        }
        assert_eq!(ep.success_rate(), Some(0.75));
    }
}
