//! The engine: one value that wires memory, context, conversation, tasks,
//! and prompt composition together.
//!
//! ```text
//! setup ──▶ sources + snapshots loaded, session and conversation opened
//!   │
//!   ├─ submit_prompt ──▶ track message ──▶ assemble context ──▶ compose ──▶ wrap
//!   ├─ execute_task  ──▶ assemble context ──▶ executor ──▶ score ──▶ momentum, outcome
//!   │
//! shutdown ──▶ conversation summarised, session closed, snapshots written
//! ```

use crate::context::{
    AssembledContext, ContextAssembler, ContextRequest, PastTask, relevance,
};
use crate::conversation::{ConversationSummary, ConversationTracker};
use ctxforge_config::AppConfig;
use ctxforge_core::{
    Clock, IdGenerator, MemoryKind, Result, Role, Standards, SystemClock, Task, TaskError,
    TaskKind, TaskStatus, UuidGenerator,
};
use ctxforge_memory::{DecayPolicy, FileSnapshots, MemoryStore, SnapshotStore};
use ctxforge_prompt::{PromptComposer, PromptRequest, wrap};
use ctxforge_rules::{SourceDocuments, load_sources};
use ctxforge_tasks::{NewTask, TaskExecutor, ValidationReport};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Owner recorded on episodic sessions.
const SESSION_USER: &str = "developer";
/// Interactions considered when estimating working pace.
const PACE_SAMPLE: usize = 50;
const MOMENTUM_STEP: i32 = 10;
/// Importance of a working-memory note about a failed task.
const FAILURE_IMPORTANCE: f64 = 40.0;

/// A composed prompt plus the context that went into it.
#[derive(Debug, Clone)]
pub struct PromptOutcome {
    pub surface: String,
    pub prompt: String,
    pub task_kind: Option<TaskKind>,
    pub context: AssembledContext,
}

pub struct Engine {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    memory: MemoryStore,
    tasks: ctxforge_tasks::TaskManager,
    tracker: ConversationTracker,
    assembler: ContextAssembler,
    sources: SourceDocuments,
    session_id: Option<String>,
}

impl Engine {
    /// Wall-clock time, random ids, and snapshots under `memory.snapshot_dir`.
    pub fn new(config: AppConfig) -> Self {
        let snapshots = Arc::new(FileSnapshots::new(config.memory.snapshot_dir.clone()));
        Self::with_seams(config, Arc::new(SystemClock), Arc::new(UuidGenerator), snapshots)
    }

    pub fn with_seams(
        config: AppConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        let policy = DecayPolicy {
            decay_rate: config.memory.decay_rate,
            min_strength: config.memory.min_strength,
            consolidation_threshold: config.memory.consolidation_threshold,
            reinforcement_bonus: config.memory.reinforcement_bonus,
        };
        let memory = MemoryStore::new(
            policy,
            config.memory.working_capacity,
            clock.clone(),
            ids.clone(),
            snapshots,
        );
        let composer =
            PromptComposer::new(Standards::default()).with_extra_rules(config.prompt.extra_rules.clone());
        let tasks = ctxforge_tasks::TaskManager::new(
            composer,
            config.tasks.pass_threshold,
            clock.clone(),
            ids.clone(),
        )
        .with_store_path(config.tasks.store_path.clone());
        let tracker = ConversationTracker::new(
            config.conversation.recent_window,
            config.conversation.initial_momentum,
            clock.clone(),
            ids,
        );
        let assembler = ContextAssembler::new(config.context.max_tokens);

        Self {
            config,
            clock,
            memory,
            tasks,
            tracker,
            assembler,
            sources: SourceDocuments::default(),
            session_id: None,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    pub fn tasks(&self) -> &ctxforge_tasks::TaskManager {
        &self.tasks
    }

    pub fn tracker(&self) -> &ConversationTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ConversationTracker {
        &mut self.tracker
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    pub fn sources(&self) -> &SourceDocuments {
        &self.sources
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Read the project's rule and history documents from `project_root`,
    /// load every snapshot, then open a session and a conversation.
    /// Nothing here fails; problems come back as warnings.
    pub async fn setup(&mut self, project_root: &Path, goals: Vec<String>) -> Vec<String> {
        let mut warnings = self.reload_sources(project_root).await;
        warnings.extend(self.memory.load().await);
        warnings.extend(self.tasks.load().await);

        let session = self.memory.start_session(SESSION_USER, goals);
        self.session_id = Some(session);
        self.tracker.start();
        self.refresh_layers();

        info!(
            root = %project_root.display(),
            rules = self.sources.rules.len(),
            tasks = self.tasks.len(),
            warnings = warnings.len(),
            "Engine ready"
        );
        warnings
    }

    /// Re-read the rule and history documents and rebuild the composer.
    pub async fn reload_sources(&mut self, project_root: &Path) -> Vec<String> {
        let sources = load_sources(
            project_root,
            &self.config.sources.rules_files,
            &self.config.sources.history_file,
        )
        .await;
        let composer = PromptComposer::new(Standards::default())
            .with_project_rules(
                sources.primary_rules().cloned(),
                sources.secondary_rules().cloned(),
            )
            .with_extra_rules(self.config.prompt.extra_rules.clone());
        self.tasks.set_composer(composer);
        self.assembler.project.project = sources.history.clone();
        self.assembler.temporal.milestones = sources.history.milestones.clone();
        let warnings = sources.warnings.clone();
        self.sources = sources;
        warnings
    }

    /// Write memory and task snapshots. Returns write warnings.
    pub async fn persist(&self) -> Vec<String> {
        let mut warnings = self.memory.save().await;
        warnings.extend(self.tasks.save().await);
        warnings
    }

    /// Summarise the conversation, close the session, and persist.
    pub async fn shutdown(&mut self) -> (Option<ConversationSummary>, Vec<String>) {
        let summary = self.tracker.end_conversation();
        if let Some(session) = self.session_id.take() {
            let satisfaction = summary
                .as_ref()
                .map_or(f64::from(self.config.conversation.initial_momentum), |s| {
                    f64::from(s.final_momentum)
                });
            let lessons = self
                .tasks
                .list(Some(TaskStatus::Failed))
                .iter()
                .filter_map(|t| t.result.as_ref()?.error.as_ref().map(|e| format!("{}: {e}", t.title)))
                .collect();
            self.memory.end_session(&session, satisfaction, lessons);
        }
        let warnings = self.persist().await;
        (summary, warnings)
    }

    // ── Prompts ────────────────────────────────────────────────────────────

    /// Track `text` as a user message and compose a prompt for `surface`.
    ///
    /// The task kind used for context gating comes from the active task,
    /// else from keywords in `text`. The active task's requirements and
    /// routing hints are folded into the prompt.
    pub fn submit_prompt(
        &mut self,
        surface: &str,
        text: &str,
        current_file: Option<&str>,
    ) -> PromptOutcome {
        self.tracker.add_message(Role::User, text);
        self.refresh_layers();

        let active = self.tasks.active();
        let task_kind = active.map(|t| t.kind).or_else(|| relevance::infer_kind(text));
        let mut request = ContextRequest::new(task_kind, text);
        if let Some(file) = current_file {
            request = request.with_current_file(file);
        }
        let context = self.assembler.assemble(&request, self.clock.now());

        let mut prompt_request = PromptRequest::new(text);
        if let Some(task) = active {
            prompt_request.component = task.context.component.clone();
            prompt_request.feature = task.context.feature.clone();
            prompt_request.target = task.context.target.clone();
        }
        prompt_request.requirements = self.tasks.active_requirements();
        let rendered = context.window.render();
        if !rendered.is_empty() {
            prompt_request = prompt_request.with_context(rendered);
        }

        let composed = self.tasks.composer().compose(&prompt_request);
        let prompt = wrap(surface, &composed);
        let cost = crate::context::token::estimate_tokens(&prompt);
        if let Some(session) = &self.session_id {
            self.memory.record_interaction(session.clone(), text, &prompt, true, cost);
        }
        debug!(
            surface,
            kind = task_kind.map(|k| k.as_str()),
            context_items = context.window.len(),
            tokens = cost,
            "Prompt composed"
        );

        PromptOutcome {
            surface: surface.to_string(),
            prompt,
            task_kind,
            context,
        }
    }

    /// Note that `path` changed just now.
    pub fn record_file_change(&mut self, path: impl Into<String>) {
        let now = self.clock.now();
        self.assembler.temporal.record_change(path, now);
    }

    // ── Tasks ──────────────────────────────────────────────────────────────

    pub fn create_task(&mut self, new: NewTask) -> Result<Task> {
        let task = self.tasks.create(new)?;
        self.tracker
            .add_message(Role::System, format!("Created task {}: {}", task.id, task.title));
        Ok(task)
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Vec<&Task> {
        self.tasks.list(status)
    }

    /// Fold this task's requirements into subsequent prompts.
    pub fn activate_task(&mut self, id: &str) -> Result<()> {
        self.tasks.activate(id)?;
        Ok(())
    }

    /// Run a pending task with its assembled context, then feed the result
    /// back into momentum, episodic outcomes, and working memory.
    pub async fn execute_task(&mut self, id: &str, executor: &dyn TaskExecutor) -> Result<Task> {
        let (kind, text) = {
            let task = self
                .tasks
                .get(id)
                .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
            (task.kind, format!("{} {}", task.title, task.description))
        };
        self.refresh_layers();
        let window = self
            .assembler
            .build(&ContextRequest::new(Some(kind), text), self.clock.now());
        let context = Some(window.render()).filter(|c| !c.is_empty());

        let task = self.tasks.execute(id, executor, context).await?;
        let success = task.status == TaskStatus::Completed;
        let score = task.result.as_ref().and_then(|r| r.score);

        let momentum = self
            .tracker
            .adjust_momentum(if success { MOMENTUM_STEP } else { -MOMENTUM_STEP });
        if let Some(session) = &self.session_id {
            self.memory.record_outcome(
                session.clone(),
                Some(task.id.clone()),
                format!("{}: {}", task.kind, task.title),
                success,
                score,
            );
        }

        let note = match (&task.result, score) {
            (Some(_), Some(score)) if success => {
                self.memory.remember(
                    format!("{} succeeded: {} (score {score})", task.kind, task.title),
                    MemoryKind::Pattern,
                    f64::from(score),
                );
                format!("Task {} completed with score {score}", task.id)
            }
            (result, _) => {
                let reason = result
                    .as_ref()
                    .and_then(|r| r.error.clone())
                    .unwrap_or_else(|| "unknown error".into());
                self.memory.remember(
                    format!("{} failed: {}: {reason}", task.kind, task.title),
                    MemoryKind::Fact,
                    FAILURE_IMPORTANCE,
                );
                format!("Task {} failed: {reason}", task.id)
            }
        };
        self.tracker.add_message(Role::System, note);
        info!(task_id = id, success, score, momentum, "Task outcome recorded");
        Ok(task)
    }

    /// Score arbitrary output; `kind` decides whether the layout check applies.
    pub fn validate_output(&self, text: &str, kind: TaskKind) -> ValidationReport {
        self.tasks.validate(text, kind)
    }

    // ── Internals ──────────────────────────────────────────────────────────

    fn refresh_layers(&mut self) {
        if let Some(state) = self.tracker.state() {
            self.assembler.conversation.established = state.established.clone();
            self.assembler.conversation.clarified = state.clarified.clone();
            self.assembler.conversation.preferences = state.preferences.clone();
        }
        self.assembler.semantic.memory = self.memory.semantic().clone();
        self.assembler.temporal.interaction_times = self
            .memory
            .recent_interactions(PACE_SAMPLE)
            .iter()
            .map(|i| i.timestamp)
            .collect();
        self.assembler.session.goals = self
            .memory
            .current_session()
            .map(|s| s.goals.clone())
            .unwrap_or_default();
        self.assembler.session.past_tasks = self
            .tasks
            .list(None)
            .into_iter()
            .filter(|t| t.status.is_terminal())
            .map(|t| PastTask {
                title: t.title.clone(),
                kind: t.kind,
                success: t.status == TaskStatus::Completed,
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxforge_core::{ExecutorError, ManualClock, SequentialIds, TaskContext};
    use ctxforge_memory::InMemorySnapshots;
    use ctxforge_tasks::FnExecutor;
    use tempfile::TempDir;

    const RULES: &str = "# Rules\n\n## Forbidden\n- `className=\"flex`\n\n## Required\n- `FlexLayout`\n\n## Checklist\n- Layout uses FlexLayout\n";
    const HISTORY: &str = "# Shopfront\nVersion: 2.1.0\nPhase: beta\n\n## Tech Stack\n- React\n\n## Conventions\n- Prefer theme tokens\n";

    fn engine(dir: &TempDir) -> Engine {
        let mut config = AppConfig::default();
        config.tasks.store_path = dir.path().join("tasks.json");
        config.sources.rules_files = vec!["RULES.md".into()];
        config.sources.history_file = "CHANGELOG.md".into();
        Engine::with_seams(
            config,
            Arc::new(ManualClock::default()),
            Arc::new(SequentialIds::new()),
            Arc::new(InMemorySnapshots::new()),
        )
    }

    async fn ready(dir: &TempDir) -> Engine {
        tokio::fs::write(dir.path().join("RULES.md"), RULES).await.unwrap();
        tokio::fs::write(dir.path().join("CHANGELOG.md"), HISTORY).await.unwrap();
        let mut engine = engine(dir);
        engine.setup(dir.path(), vec!["Ship pricing".into()]).await;
        engine
    }

    fn component(title: &str) -> NewTask {
        NewTask::new(TaskKind::CreateComponent, title, "Show plan pricing").with_context(TaskContext {
            component: Some(title.into()),
            requirements: vec!["Support dark mode".into()],
            ..TaskContext::default()
        })
    }

    #[tokio::test]
    async fn setup_without_sources_warns_and_continues() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let warnings = engine.setup(dir.path(), vec![]).await;
        assert!(!warnings.is_empty());
        assert!(engine.session_id().is_some());
        assert!(engine.tracker().state().is_some());
        assert!(!engine.tasks().composer().is_project_mode());
    }

    #[tokio::test]
    async fn setup_loads_project_rules_and_history() {
        let dir = TempDir::new().unwrap();
        let engine = ready(&dir).await;
        assert!(engine.tasks().composer().is_project_mode());
        assert_eq!(engine.sources().history.name, "Shopfront");
        assert_eq!(engine.assembler().session.goals, vec!["Ship pricing".to_string()]);
    }

    #[tokio::test]
    async fn prompt_carries_context_and_surface_wrapper() {
        let dir = TempDir::new().unwrap();
        let mut engine = ready(&dir).await;
        let outcome = engine.submit_prompt("claude", "Update the theme colours", Some("src/Header.tsx"));
        assert!(outcome.prompt.starts_with("<instructions>"));
        assert!(outcome.prompt.contains("## Context"));
        assert!(outcome.prompt.contains("Project: Shopfront v2.1.0 (beta)"));
        assert!(outcome.prompt.contains("Current file: src/Header.tsx"));
        assert_eq!(outcome.task_kind, Some(TaskKind::UpdateStyles));
        assert_eq!(engine.memory().recent_interactions(10).len(), 1);
        assert_eq!(engine.tracker().state().unwrap().messages.len(), 1);
    }

    #[test]
    fn file_changes_older_than_an_hour_are_dropped() {
        let clock = Arc::new(ManualClock::default());
        let mut engine = Engine::with_seams(
            AppConfig::default(),
            clock.clone(),
            Arc::new(SequentialIds::new()),
            Arc::new(InMemorySnapshots::new()),
        );
        engine.record_file_change("src/Old.tsx");
        clock.advance(chrono::Duration::minutes(90));
        engine.record_file_change("src/Header.tsx");

        let changes = &engine.assembler().temporal.file_changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "src/Header.tsx");
    }

    #[tokio::test]
    async fn active_task_requirements_reach_the_prompt() {
        let dir = TempDir::new().unwrap();
        let mut engine = ready(&dir).await;
        let task = engine.create_task(component("PricingCard")).unwrap();
        engine.activate_task(&task.id).unwrap();
        let outcome = engine.submit_prompt("cursor", "Make it responsive", None);
        assert!(outcome.prompt.contains("Support dark mode"));
        assert!(outcome.prompt.contains("Component: PricingCard"));
        assert_eq!(outcome.task_kind, Some(TaskKind::CreateComponent));
    }

    #[tokio::test]
    async fn successful_execution_raises_momentum() {
        let dir = TempDir::new().unwrap();
        let mut engine = ready(&dir).await;
        let task = engine.create_task(component("PricingCard")).unwrap();
        let exec = FnExecutor::new("ok", |_: &Task, _: &str| {
            Ok("<FlexLayout gap=\"md\">Pricing</FlexLayout>".to_string())
        });

        let done = engine.execute_task(&task.id, &exec).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(engine.tracker().momentum(), 60);
        let outcomes = &engine.memory().episodic().outcomes;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].score, Some(100));
        assert_eq!(engine.memory().working().len(), 1);
    }

    #[tokio::test]
    async fn failed_execution_lowers_momentum() {
        let dir = TempDir::new().unwrap();
        let mut engine = ready(&dir).await;
        let task = engine.create_task(component("PricingCard")).unwrap();
        let exec = FnExecutor::new("down", |_: &Task, _: &str| {
            Err(ExecutorError::Failed("model offline".into()))
        });

        let done = engine.execute_task(&task.id, &exec).await.unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert_eq!(engine.tracker().momentum(), 40);
        assert!(!engine.memory().episodic().outcomes[0].success);
    }

    #[tokio::test]
    async fn executing_twice_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut engine = ready(&dir).await;
        let task = engine.create_task(component("PricingCard")).unwrap();
        let exec = FnExecutor::new("ok", |_: &Task, _: &str| Ok("<FlexLayout/>".to_string()));
        engine.execute_task(&task.id, &exec).await.unwrap();
        assert!(engine.execute_task(&task.id, &exec).await.is_err());
        assert_eq!(engine.tracker().momentum(), 60);
    }

    #[tokio::test]
    async fn shutdown_closes_the_session_and_persists_tasks() {
        let dir = TempDir::new().unwrap();
        let mut engine = ready(&dir).await;
        engine.create_task(component("PricingCard")).unwrap();
        engine.submit_prompt("chatgpt", "hello", None);

        let (summary, warnings) = engine.shutdown().await;
        assert!(warnings.is_empty(), "{warnings:?}");
        let summary = summary.unwrap();
        assert_eq!(summary.message_count, 2);
        assert!(engine.session_id().is_none());
        assert!(engine.memory().current_session().is_none());
        assert!(dir.path().join("tasks.json").exists());

        let mut reopened = self::engine(&dir);
        reopened.setup(dir.path(), vec![]).await;
        assert_eq!(reopened.list_tasks(None).len(), 1);
    }

    #[test]
    fn validate_output_applies_the_layout_check() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let report = engine.validate_output("<div className=\"flex\">x</div>", TaskKind::CreateComponent);
        assert_eq!(report.score, 70);
    }
}
