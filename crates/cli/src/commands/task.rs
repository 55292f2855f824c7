//! `ctxforge task`: create, list, activate, and execute tasks.

use super::CommandContext;
use async_trait::async_trait;
use clap::ValueEnum;
use ctxforge_core::{ExecutorError, Task, TaskContext, TaskKind, TaskPriority, TaskStatus};
use ctxforge_tasks::{NewTask, TaskExecutor};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => TaskStatus::Pending,
            StatusArg::InProgress => TaskStatus::InProgress,
            StatusArg::Completed => TaskStatus::Completed,
            StatusArg::Failed => TaskStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityArg> for TaskPriority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => TaskPriority::Low,
            PriorityArg::Medium => TaskPriority::Medium,
            PriorityArg::High => TaskPriority::High,
            PriorityArg::Critical => TaskPriority::Critical,
        }
    }
}

pub struct CreateArgs {
    pub kind: String,
    pub title: String,
    pub description: String,
    pub component: Option<String>,
    pub feature: Option<String>,
    pub target: Option<String>,
    pub requirements: Vec<String>,
    pub affected_files: Vec<String>,
    pub priority: Option<PriorityArg>,
    pub activate: bool,
}

/// Takes the assistant's output from a file written by the user.
pub struct FileExecutor {
    path: PathBuf,
}

impl FileExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaskExecutor for FileExecutor {
    fn name(&self) -> &str {
        "file"
    }

    async fn execute(&self, _task: &Task, _prompt: &str) -> Result<String, ExecutorError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ExecutorError::Failed(format!("could not read {}: {e}", self.path.display()))
        })
    }
}

pub async fn create(ctx: &CommandContext, args: CreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let kind: TaskKind = args.kind.parse()?;
    let context = TaskContext {
        component: args.component,
        feature: args.feature,
        target: args.target,
        requirements: args.requirements,
        affected_files: args.affected_files,
    };
    let new = NewTask::new(kind, args.title, args.description)
        .with_context(context)
        .with_priority(args.priority.map(Into::into).unwrap_or_default());

    let mut engine = ctx.open_engine().await?;
    let task = engine.create_task(new)?;
    if args.activate {
        engine.activate_task(&task.id)?;
    }
    println!("✅ Created {} ({}): {}", task.id, task.kind, task.title);
    if args.activate {
        println!("   Active: its requirements are now part of every prompt");
    }
    ctx.close_engine(engine).await;
    Ok(())
}

pub async fn list(
    ctx: &CommandContext,
    status: Option<StatusArg>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.open_engine().await?;
    let active = engine.tasks().active().map(|t| t.id.clone());
    let tasks = engine.list_tasks(status.map(Into::into));
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks.");
    }
    for task in tasks {
        let marker = if active.as_deref() == Some(task.id.as_str()) { "*" } else { " " };
        let score = task
            .result
            .as_ref()
            .and_then(|r| r.score)
            .map(|s| format!(" score={s}"))
            .unwrap_or_default();
        println!(
            "{marker} {:<14} {:<12} {:<22} {}{score}",
            task.id, task.status, task.kind, task.title
        );
    }
    Ok(())
}

pub async fn activate(ctx: &CommandContext, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = ctx.open_engine().await?;
    engine.activate_task(id)?;
    println!("✅ {id} is now the active task");
    ctx.close_engine(engine).await;
    Ok(())
}

pub async fn execute(ctx: &CommandContext, id: &str, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = ctx.open_engine().await?;
    let executor = FileExecutor::new(output);
    let result = engine.execute_task(id, &executor).await;
    ctx.close_engine(engine).await;
    let task = result?;

    println!("{} {}: {}", task.id, task.status, task.title);
    if let Some(result) = &task.result {
        if let Some(score) = result.score {
            println!("Score: {score}/100");
        }
        if let Some(error) = &result.error {
            println!("❌ {error}");
        }
        for warning in &result.warnings {
            println!("  ⚠️  {warning}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxforge_core::{Clock, ManualClock};

    fn sample_task() -> Task {
        Task::new("task_1", TaskKind::FixBug, "t", "d", TaskContext::default(), ManualClock::default().now())
    }

    #[tokio::test]
    async fn file_executor_reads_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.tsx");
        tokio::fs::write(&path, "<FlexLayout/>").await.unwrap();
        let exec = FileExecutor::new(&path);
        let out = exec.execute(&sample_task(), "prompt").await.unwrap();
        assert_eq!(out, "<FlexLayout/>");
    }

    #[tokio::test]
    async fn missing_output_file_is_an_executor_failure() {
        let exec = FileExecutor::new("/nonexistent/ctxforge/out.tsx");
        let err = exec.execute(&sample_task(), "prompt").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Failed(_)));
    }

    #[test]
    fn status_arg_maps_to_task_status() {
        assert_eq!(TaskStatus::from(StatusArg::InProgress), TaskStatus::InProgress);
        assert_eq!(TaskPriority::from(PriorityArg::Critical), TaskPriority::Critical);
    }
}
