//! Task domain types and the lifecycle state machine.
//!
//! ```text
//! pending ──start──▶ in_progress ──finish(ok)──▶ completed
//!                         │
//!                         └────finish(err)─────▶ failed
//! ```
//!
//! `completed` and `failed` are terminal. The result is written exactly once,
//! by the transition out of `in_progress`.

use crate::error::TaskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The nine kinds of work the task manager knows templates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CreateComponent,
    CreatePage,
    CreateFeature,
    UpdateStyles,
    FixBug,
    Refactor,
    AddTests,
    AddTranslations,
    ImproveAccessibility,
}

impl TaskKind {
    pub const ALL: [TaskKind; 9] = [
        TaskKind::CreateComponent,
        TaskKind::CreatePage,
        TaskKind::CreateFeature,
        TaskKind::UpdateStyles,
        TaskKind::FixBug,
        TaskKind::Refactor,
        TaskKind::AddTests,
        TaskKind::AddTranslations,
        TaskKind::ImproveAccessibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateComponent => "create_component",
            Self::CreatePage => "create_page",
            Self::CreateFeature => "create_feature",
            Self::UpdateStyles => "update_styles",
            Self::FixBug => "fix_bug",
            Self::Refactor => "refactor",
            Self::AddTests => "add_tests",
            Self::AddTranslations => "add_translations",
            Self::ImproveAccessibility => "improve_accessibility",
        }
    }

    /// Bug fixes are exempt from the layout-component requirement.
    pub fn is_bug_fix(&self) -> bool {
        matches!(self, Self::FixBug)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown task kind '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Routing hints and requirements attached to a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,

    /// Target directory for generated files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub affected_files: Vec<String>,
}

/// The immutable outcome of an execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,

    /// Generated text (empty on failure)
    #[serde(default)]
    pub output: String,

    /// Validation score in [0, 100]; absent when the executor failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub completed_at: DateTime<Utc>,
}

/// One unit of requested work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub context: TaskContext,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        kind: TaskKind,
        title: impl Into<String>,
        description: impl Into<String>,
        context: TaskContext,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: description.into(),
            context,
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            created_at: now,
            updated_at: now,
            result: None,
        }
    }

    /// `pending → in_progress`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TaskError> {
        if self.status != TaskStatus::Pending {
            return Err(self.invalid(TaskStatus::InProgress));
        }
        self.status = TaskStatus::InProgress;
        self.updated_at = now;
        Ok(())
    }

    /// `in_progress → completed | failed`, chosen by `result.success`.
    pub fn finish(&mut self, result: TaskResult) -> Result<(), TaskError> {
        let next = if result.success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        if self.status != TaskStatus::InProgress || self.result.is_some() {
            return Err(self.invalid(next));
        }
        self.status = next;
        self.updated_at = result.completed_at;
        self.result = Some(result);
        Ok(())
    }

    fn invalid(&self, to: TaskStatus) -> TaskError {
        TaskError::InvalidTransition {
            id: self.id.clone(),
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::new(
            "task_1",
            TaskKind::CreateComponent,
            "Button",
            "Primary button",
            TaskContext::default(),
            Utc::now(),
        )
    }

    fn result(success: bool) -> TaskResult {
        TaskResult {
            success,
            output: String::new(),
            score: success.then_some(100),
            warnings: vec![],
            error: (!success).then(|| "boom".to_string()),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn kind_parses_from_snake_and_kebab_case() {
        assert_eq!("create_component".parse::<TaskKind>().unwrap(), TaskKind::CreateComponent);
        assert_eq!("fix-bug".parse::<TaskKind>().unwrap(), TaskKind::FixBug);
        let err = "paint_house".parse::<TaskKind>().unwrap_err();
        assert!(err.contains("update_styles"));
    }

    #[test]
    fn all_kinds_roundtrip_through_str() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.as_str().parse::<TaskKind>().unwrap(), kind);
        }
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut t = task();
        t.start(Utc::now()).unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        t.finish(result(true)).unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert!(t.result.is_some());
    }

    #[test]
    fn failure_result_marks_failed() {
        let mut t = task();
        t.start(Utc::now()).unwrap();
        t.finish(result(false)).unwrap();
        assert_eq!(t.status, TaskStatus::Failed);
    }

    #[test]
    fn result_is_written_once() {
        let mut t = task();
        t.start(Utc::now()).unwrap();
        t.finish(result(true)).unwrap();
        assert!(t.finish(result(false)).is_err());
        assert_eq!(t.status, TaskStatus::Completed);
        assert!(t.result.as_ref().unwrap().success);
    }

    #[test]
    fn cannot_finish_without_starting() {
        let mut t = task();
        assert!(t.finish(result(true)).is_err());
        assert!(t.result.is_none());
    }

    #[test]
    fn cannot_restart_terminal_task() {
        let mut t = task();
        t.start(Utc::now()).unwrap();
        t.finish(result(true)).unwrap();
        assert!(t.start(Utc::now()).is_err());
    }

    #[test]
    fn only_fix_bug_is_bug_fix() {
        let bug_fixes: Vec<_> = TaskKind::ALL.iter().filter(|k| k.is_bug_fix()).collect();
        assert_eq!(bug_fixes, vec![&TaskKind::FixBug]);
    }
}
