//! The executor seam: whatever turns a composed prompt into generated text.

use async_trait::async_trait;
use ctxforge_core::{ExecutorError, Task};

#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Executor name, for logs.
    fn name(&self) -> &str {
        "executor"
    }

    /// Produce output for `task` from its composed `prompt`.
    async fn execute(&self, task: &Task, prompt: &str) -> Result<String, ExecutorError>;
}

/// Adapts a plain closure into a [`TaskExecutor`].
pub struct FnExecutor<F> {
    name: String,
    f: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&Task, &str) -> Result<String, ExecutorError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> TaskExecutor for FnExecutor<F>
where
    F: Fn(&Task, &str) -> Result<String, ExecutorError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, task: &Task, prompt: &str) -> Result<String, ExecutorError> {
        (self.f)(task, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ctxforge_core::{TaskContext, TaskKind};

    #[tokio::test]
    async fn closure_executor_sees_the_prompt() {
        let exec = FnExecutor::new("echo", |task: &Task, prompt: &str| {
            Ok(format!("{}:{}", task.id, prompt.len()))
        });
        let task = Task::new("task_1", TaskKind::Refactor, "t", "d", TaskContext::default(), Utc::now());
        assert_eq!(exec.name(), "echo");
        assert_eq!(exec.execute(&task, "abcd").await.unwrap(), "task_1:4");
    }
}
