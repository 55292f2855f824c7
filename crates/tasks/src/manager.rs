//! Task lifecycle manager.
//!
//! Owns every task, composes their prompts, runs them through an injected
//! [`TaskExecutor`], and scores the output. Executor failures become failed
//! tasks; a low score only adds a warning to a completed task.

use crate::executor::TaskExecutor;
use crate::templates::render_instructions;
use crate::validator::{ValidationReport, validate_output};
use ctxforge_core::error::TaskError;
use ctxforge_core::{Clock, IdGenerator, Task, TaskContext, TaskKind, TaskPriority, TaskResult, TaskStatus};
use ctxforge_prompt::{PromptComposer, PromptRequest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Arguments for [`TaskManager::create`].
#[derive(Debug, Clone)]
pub struct NewTask {
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub context: TaskContext,
    pub priority: TaskPriority,
}

impl NewTask {
    pub fn new(kind: TaskKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            context: TaskContext::default(),
            priority: TaskPriority::default(),
        }
    }

    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// On-disk form of the task list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskSnapshot {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<String>,
}

pub struct TaskManager {
    tasks: Vec<Task>,
    active: Option<String>,
    composer: PromptComposer,
    pass_threshold: u8,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    store_path: Option<PathBuf>,
}

impl TaskManager {
    pub fn new(
        composer: PromptComposer,
        pass_threshold: u8,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            tasks: Vec::new(),
            active: None,
            composer,
            pass_threshold: pass_threshold.min(100),
            clock,
            ids,
            store_path: None,
        }
    }

    /// Persist to and load from `path`.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Swap the composer, e.g. after project rules were reloaded.
    pub fn set_composer(&mut self, composer: PromptComposer) {
        self.composer = composer;
    }

    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    // ── CRUD ───────────────────────────────────────────────────────────────

    pub fn create(&mut self, new: NewTask) -> Result<Task, TaskError> {
        if new.title.trim().is_empty() {
            return Err(TaskError::MissingField { field: "title" });
        }
        if new.description.trim().is_empty() {
            return Err(TaskError::MissingField {
                field: "description",
            });
        }

        let mut task = Task::new(
            self.ids.next_id("task"),
            new.kind,
            new.title.trim(),
            new.description.trim(),
            new.context,
            self.clock.now(),
        );
        task.priority = new.priority;
        info!(task_id = %task.id, kind = %task.kind, title = %task.title, "Task created");
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks in creation order, optionally filtered by status.
    pub fn list(&self, status: Option<TaskStatus>) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Mark `id` as the task whose requirements feed subsequent prompts.
    pub fn activate(&mut self, id: &str) -> Result<(), TaskError> {
        if self.get(id).is_none() {
            return Err(TaskError::NotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        debug!(task_id = id, "Task activated");
        Ok(())
    }

    pub fn active(&self) -> Option<&Task> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    /// Requirements of the active task, empty when none is active.
    pub fn active_requirements(&self) -> Vec<String> {
        self.active()
            .map(|t| t.context.requirements.clone())
            .unwrap_or_default()
    }

    // ── Prompting & execution ──────────────────────────────────────────────

    /// Compose the full prompt for a task, with an optional context block.
    pub fn generate_prompt(&self, id: &str, context: Option<String>) -> Result<String, TaskError> {
        let task = self
            .get(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        Ok(self.compose_for(task, context))
    }

    fn compose_for(&self, task: &Task, context: Option<String>) -> String {
        let request = PromptRequest {
            body: render_instructions(task),
            component: task.context.component.clone(),
            feature: task.context.feature.clone(),
            target: task.context.target.clone(),
            context,
            requirements: task.context.requirements.clone(),
        };
        self.composer.compose(&request)
    }

    pub fn validate(&self, text: &str, kind: TaskKind) -> ValidationReport {
        validate_output(text, kind, self.composer.standards())
    }

    /// Run a pending task. Rejects any other status without touching the task.
    pub async fn execute(
        &mut self,
        id: &str,
        executor: &dyn TaskExecutor,
        context: Option<String>,
    ) -> Result<Task, TaskError> {
        let task = self
            .get(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if task.status != TaskStatus::Pending {
            return Err(TaskError::InvalidTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: TaskStatus::InProgress.to_string(),
            });
        }
        let prompt = self.compose_for(task, context);

        let now = self.clock.now();
        let snapshot = {
            let task = self.get_mut(id)?;
            task.start(now)?;
            task.clone()
        };
        info!(task_id = id, executor = executor.name(), "Task started");

        let result = match executor.execute(&snapshot, &prompt).await {
            Ok(output) => {
                let report = self.validate(&output, snapshot.kind);
                let passed = report.passed(self.pass_threshold);
                let mut warnings = report.warnings;
                if !passed {
                    warnings.push(format!(
                        "Score {} is below the pass threshold of {}",
                        report.score, self.pass_threshold
                    ));
                }
                TaskResult {
                    success: true,
                    output,
                    score: Some(report.score),
                    warnings,
                    error: None,
                    completed_at: self.clock.now(),
                }
            }
            Err(e) => {
                warn!(task_id = id, error = %e, "Executor failed");
                TaskResult {
                    success: false,
                    output: String::new(),
                    score: None,
                    warnings: Vec::new(),
                    error: Some(e.to_string()),
                    completed_at: self.clock.now(),
                }
            }
        };

        let task = self.get_mut(id)?;
        task.finish(result)?;
        info!(
            task_id = id,
            status = %task.status,
            score = task.result.as_ref().and_then(|r| r.score),
            "Task finished"
        );
        Ok(task.clone())
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    // ── Persistence ────────────────────────────────────────────────────────

    /// Replace the task list with the stored snapshot. Returns warnings.
    pub async fn load(&mut self) -> Vec<String> {
        let Some(path) = self.store_path.clone() else {
            return Vec::new();
        };
        match read_snapshot(&path).await {
            Ok(snapshot) => {
                self.tasks = snapshot.tasks;
                self.active = snapshot.active.filter(|id| self.tasks.iter().any(|t| &t.id == id));
                debug!(path = %path.display(), tasks = self.tasks.len(), "Tasks loaded");
                Vec::new()
            }
            Err(warning) => {
                warn!(path = %path.display(), "{warning}");
                vec![warning]
            }
        }
    }

    /// Write the whole task list. Failures become warnings.
    pub async fn save(&self) -> Vec<String> {
        let Some(path) = self.store_path.as_deref() else {
            return Vec::new();
        };
        let snapshot = TaskSnapshot {
            tasks: self.tasks.clone(),
            active: self.active.clone(),
        };
        match write_snapshot(path, &snapshot).await {
            Ok(()) => {
                debug!(path = %path.display(), tasks = self.tasks.len(), "Tasks saved");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Task snapshot write failed");
                vec![e.to_string()]
            }
        }
    }
}

async fn read_snapshot(path: &Path) -> Result<TaskSnapshot, String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(format!("No task snapshot at {}; starting empty", path.display()));
        }
        Err(e) => return Err(format!("Could not read {}: {e}", path.display())),
    };
    serde_json::from_str(&content)
        .map_err(|e| format!("Corrupt task snapshot {}: {e}", path.display()))
}

async fn write_snapshot(path: &Path, snapshot: &TaskSnapshot) -> Result<(), TaskError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TaskError::Storage(format!("Failed to create task directory: {e}")))?;
    }
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| TaskError::Storage(format!("Failed to serialize tasks: {e}")))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| TaskError::Storage(format!("Failed to write {}: {e}", path.display())))
}
