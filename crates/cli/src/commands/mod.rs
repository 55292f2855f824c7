//! Command implementations. Each command opens an [`Engine`] for the
//! project root, does its work, and shuts the engine down so snapshots and
//! the task list are written back.

pub mod prompt;
pub mod setup;
pub mod task;
pub mod validate;

use ctxforge_agent::Engine;
use ctxforge_config::AppConfig;
use std::path::PathBuf;

/// Options shared by every command.
pub struct CommandContext {
    pub config_path: Option<PathBuf>,
    pub root: PathBuf,
}

impl CommandContext {
    pub fn load_config(&self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let config = match &self.config_path {
            Some(path) => {
                let mut config = AppConfig::load_from(path)?;
                config.apply_env_overrides(|key| std::env::var(key).ok())?;
                config.validate()?;
                config
            }
            None => AppConfig::load()?,
        };
        Ok(config)
    }

    /// Load config, then set up an engine over `root`.
    pub async fn open_engine(&self) -> Result<Engine, Box<dyn std::error::Error>> {
        let config = self
            .load_config()
            .map_err(|e| format!("Failed to load config: {e}"))?;
        let mut engine = Engine::new(config);
        let warnings = engine.setup(&self.root, Vec::new()).await;
        for warning in &warnings {
            tracing::debug!("{warning}");
        }
        Ok(engine)
    }

    /// Close the engine, surfacing write failures.
    pub async fn close_engine(&self, mut engine: Engine) {
        let (_, warnings) = engine.shutdown().await;
        for warning in warnings {
            eprintln!("⚠️  {warning}");
        }
    }
}
