//! End-to-end tests for ctxforge.
//!
//! The first group drives the engine with real files on disk (rule documents,
//! changelog, memory snapshots, task store). The second runs the compiled
//! binary against a temporary home directory.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use ctxforge_agent::{Engine, Mood};
use ctxforge_config::AppConfig;
use ctxforge_core::{ManualClock, MemoryKind, SequentialIds, Task, TaskContext, TaskKind, TaskStatus};
use ctxforge_memory::FileSnapshots;
use ctxforge_tasks::{FnExecutor, NewTask};
use tempfile::TempDir;

const RULES: &str = "\
# Project Rules

## Coding Standards
- Components are function components
- Props interfaces are exported

## Forbidden Patterns
- `className=\"flex`
- ❌ `style={{`

## Required Patterns
- `FlexLayout`
- `GridLayout`

## Final Checklist
- Uses FlexLayout or GridLayout
- No inline styles
";

const CHANGELOG: &str = "\
# Shopfront
Version: 2.1.0
Phase: beta

## Tech Stack
- React 18
- TypeScript 5

## Conventions
- Prefer theme tokens over raw colours
- Keep route files flat

## [2.1.0] - 2026-03-02
- Pricing page

## [2.0.0] - 2026-01-15
- Checkout rewrite
";

// ── Engine pipeline ───────────────────────────────────────────────────────

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("RULES.md"), RULES).await.unwrap();
        tokio::fs::write(dir.path().join("CHANGELOG.md"), CHANGELOG).await.unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.memory.snapshot_dir = self.root().join("state/memory");
        config.tasks.store_path = self.root().join("state/tasks.json");
        config.sources.rules_files = vec!["RULES.md".into(), "docs/STANDARDS.md".into()];
        config.sources.history_file = "CHANGELOG.md".into();
        config
    }

    fn engine(&self, clock: Arc<ManualClock>) -> Engine {
        let config = self.config();
        let snapshots = Arc::new(FileSnapshots::new(config.memory.snapshot_dir.clone()));
        Engine::with_seams(config, clock, Arc::new(SequentialIds::new()), snapshots)
    }
}

#[tokio::test]
async fn scored_task_survives_a_restart() {
    let ws = Workspace::new().await;
    let clock = Arc::new(ManualClock::default());
    let mut engine = ws.engine(clock.clone());
    let warnings = engine.setup(ws.root(), vec!["Ship the pricing card".into()]).await;
    // docs/STANDARDS.md is absent; the missing snapshots warn too.
    assert!(warnings.iter().any(|w| w.contains("STANDARDS.md")));
    assert!(engine.tasks().composer().is_project_mode());

    let task = engine
        .create_task(NewTask::new(
            TaskKind::CreateComponent,
            "PricingCard",
            "Card showing the plan price",
        ))
        .unwrap();
    let exec = FnExecutor::new("scripted", |_: &Task, prompt: &str| {
        assert!(prompt.contains("Create a new component: PricingCard"));
        assert!(prompt.contains("## Context"));
        Ok("<div className=\"flex items-center\">Pro</div>".to_string())
    });
    let done = engine.execute_task(&task.id, &exec).await.unwrap();

    // Raw flex without a layout component: completed, but scored down.
    assert_eq!(done.status, TaskStatus::Completed);
    let result = done.result.as_ref().unwrap();
    assert!(result.score.unwrap() <= 70);
    assert!(!result.warnings.is_empty());

    let (summary, write_warnings) = engine.shutdown().await;
    assert!(write_warnings.is_empty(), "{write_warnings:?}");
    assert_eq!(summary.unwrap().final_momentum, 60);
    for file in ["working.json", "episodic.json", "semantic.json", "procedural.json"] {
        assert!(ws.root().join("state/memory").join(file).exists(), "{file} missing");
    }

    let mut reopened = ws.engine(clock);
    reopened.setup(ws.root(), vec![]).await;
    let tasks = reopened.list_tasks(Some(TaskStatus::Completed));
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
    assert_eq!(reopened.memory().working().len(), 1);
    let sessions = &reopened.memory().episodic().sessions;
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].ended_at.is_some());
    assert_eq!(reopened.memory().episodic().outcomes.len(), 1);
}

#[tokio::test]
async fn prompts_carry_project_context_for_every_surface() {
    let ws = Workspace::new().await;
    let mut engine = ws.engine(Arc::new(ManualClock::default()));
    engine.setup(ws.root(), vec![]).await;

    let claude = engine.submit_prompt("claude", "Restyle the header with theme tokens", None);
    assert!(claude.prompt.starts_with("<instructions>"));
    assert!(claude.prompt.contains("# Project Rules"));
    assert!(claude.prompt.contains("Project: Shopfront v2.1.0 (beta)"));
    assert!(claude.prompt.contains("Conventions: Prefer theme tokens over raw colours"));
    assert!(!claude.prompt.contains("Keep route files flat"));
    assert!(claude.prompt.contains("Recent milestones: 2.1.0 (2026-03-02), 2.0.0 (2026-01-15)"));
    assert!(claude.prompt.contains("- Uses FlexLayout or GridLayout"));

    let plain = engine.submit_prompt("notepad", "Restyle the header with theme tokens", None);
    assert!(plain.prompt.starts_with("# Project Rules"));

    let cursor = engine.submit_prompt("cursor", "Restyle the header with theme tokens", None);
    assert_ne!(cursor.prompt, plain.prompt);

    assert_eq!(engine.memory().recent_interactions(10).len(), 3);
}

#[tokio::test]
async fn conversation_mood_follows_the_user() {
    let ws = Workspace::new().await;
    let mut engine = ws.engine(Arc::new(ManualClock::default()));
    engine.setup(ws.root(), vec![]).await;

    engine.submit_prompt("claude", "Let's build the pricing card", None);
    assert_eq!(engine.tracker().mood(), Mood::Collaborative);

    engine.submit_prompt("claude", "It crashes with an error on load", None);
    assert_eq!(engine.tracker().mood(), Mood::Debugging);

    engine.tracker_mut().establish_fact("Pricing cards use GridLayout");
    let outcome = engine.submit_prompt("claude", "Thanks, looks good", None);
    assert!(outcome.prompt.contains("Established: Pricing cards use GridLayout"));
}

#[tokio::test]
async fn weak_memories_fade_between_sessions() {
    let ws = Workspace::new().await;
    let clock = Arc::new(ManualClock::default());
    let mut engine = ws.engine(clock.clone());
    engine.setup(ws.root(), vec![]).await;
    engine
        .memory_mut()
        .remember("Header uses a sticky layout", MemoryKind::Fact, 40.0);
    engine
        .memory_mut()
        .remember("Design tokens live in theme.ts", MemoryKind::Concept, 90.0);
    engine.shutdown().await;

    clock.advance(chrono::Duration::days(60));
    let mut later = ws.engine(clock);
    later.setup(ws.root(), vec![]).await;

    // Both decayed out of working memory; only the important one was promoted.
    assert!(later.memory().working().is_empty());
    let concepts: Vec<&str> = later
        .memory()
        .semantic()
        .concepts
        .values()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(concepts, vec!["Design tokens live in theme.ts"]);
    assert!(later.memory().semantic().knowledge.is_empty());
}

#[tokio::test]
async fn requirements_of_the_active_task_reach_prompts() {
    let ws = Workspace::new().await;
    let mut engine = ws.engine(Arc::new(ManualClock::default()));
    engine.setup(ws.root(), vec![]).await;
    let task = engine
        .create_task(
            NewTask::new(TaskKind::AddTranslations, "Checkout strings", "Extract checkout copy")
                .with_context(TaskContext {
                    feature: Some("checkout".into()),
                    requirements: vec!["Cover de and fr locales".into()],
                    ..TaskContext::default()
                }),
        )
        .unwrap();
    engine.activate_task(&task.id).unwrap();

    let outcome = engine.submit_prompt("copilot", "Start with the summary panel", None);
    assert_eq!(outcome.task_kind, Some(TaskKind::AddTranslations));
    assert!(outcome.prompt.contains("Cover de and fr locales"));
    assert!(outcome.prompt.contains("Feature: checkout"));
}

// ── Binary ────────────────────────────────────────────────────────────────

fn ctxforge(home: &Path, root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ctxforge"))
        .env("CTXFORGE_HOME", home)
        .env_remove("CTXFORGE_CONFIG")
        .env_remove("CTXFORGE_MAX_TOKENS")
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run ctxforge")
}

fn stdout(output: &std::process::Output) -> String {
    assert!(
        output.status.success(),
        "ctxforge failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test]
async fn cli_task_lifecycle() {
    let ws = Workspace::new().await;
    let home = TempDir::new().unwrap();

    let out = stdout(&ctxforge(home.path(), ws.root(), &["setup"]));
    assert!(out.contains("Created config.toml"));
    assert!(home.path().join("config.toml").exists());
    assert!(out.contains("History: Shopfront 2.1.0"));

    let out = stdout(&ctxforge(
        home.path(),
        ws.root(),
        &[
            "task",
            "create",
            "--kind",
            "create_component",
            "--title",
            "PricingCard",
            "--description",
            "Card showing the plan price",
            "--requirement",
            "Support dark mode",
            "--activate",
        ],
    ));
    let id = out
        .split_whitespace()
        .nth(2)
        .expect("task id in create output")
        .to_string();
    assert!(id.starts_with("task_"));

    let out = stdout(&ctxforge(home.path(), ws.root(), &["task", "list"]));
    assert!(out.contains(&id));
    assert!(out.contains("pending"));

    let out = stdout(&ctxforge(home.path(), ws.root(), &["prompt", "cursor", "Add a monthly toggle"]));
    assert!(out.contains("Support dark mode"));

    let output_file = ws.root().join("PricingCard.tsx");
    tokio::fs::write(&output_file, "<FlexLayout gap=\"md\">Pro</FlexLayout>")
        .await
        .unwrap();
    let out = stdout(&ctxforge(
        home.path(),
        ws.root(),
        &["task", "execute", &id, "--output", output_file.to_str().unwrap()],
    ));
    assert!(out.contains("completed"));
    assert!(out.contains("Score: 100/100"));

    // Re-running a finished task is a caller error.
    let rerun = ctxforge(
        home.path(),
        ws.root(),
        &["task", "execute", &id, "--output", output_file.to_str().unwrap()],
    );
    assert!(!rerun.status.success());
}

#[tokio::test]
async fn cli_validate_scores_a_file() {
    let ws = Workspace::new().await;
    let home = TempDir::new().unwrap();
    let file = ws.root().join("Card.tsx");
    tokio::fs::write(&file, "<div className=\"flex\">x</div>").await.unwrap();

    let out = stdout(&ctxforge(home.path(), ws.root(), &["validate", file.to_str().unwrap()]));
    assert!(out.contains("Score: 70/100"));
    assert!(out.contains("Below the pass threshold of 80"));

    let unknown = ctxforge(
        home.path(),
        ws.root(),
        &["validate", file.to_str().unwrap(), "--kind", "paint"],
    );
    assert!(!unknown.status.success());
}
