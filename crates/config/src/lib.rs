//! Configuration loading, validation, and management for ctxforge.
//!
//! Loads configuration from `~/.ctxforge/config.toml` with environment
//! variable overrides. Every table rejects unknown keys, so a typo in the
//! config file fails at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that relocates the whole `~/.ctxforge` directory.
pub const HOME_ENV: &str = "CTXFORGE_HOME";
/// Environment variable that overrides `context.max_tokens`.
pub const MAX_TOKENS_ENV: &str = "CTXFORGE_MAX_TOKENS";

/// The root configuration structure.
///
/// Maps directly to `~/.ctxforge/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Context window configuration
    #[serde(default)]
    pub context: ContextConfig,

    /// Conversation tracker configuration
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Task manager configuration
    #[serde(default)]
    pub tasks: TaskConfig,

    /// External rule and history documents
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Prompt composer configuration
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Directory holding the four tier snapshots
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Maximum items in working memory
    #[serde(default = "default_working_capacity")]
    pub working_capacity: usize,

    /// Evicted items at or above this importance are promoted
    #[serde(default = "default_consolidation_threshold")]
    pub consolidation_threshold: f64,

    /// Forgetting-curve rate per day
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Items decaying below this strength are forgotten
    #[serde(default = "default_min_strength")]
    pub min_strength: f64,

    /// Importance added by each reinforcement
    #[serde(default = "default_reinforcement_bonus")]
    pub reinforcement_bonus: f64,
}

fn default_snapshot_dir() -> PathBuf {
    AppConfig::config_dir().join("memory")
}
fn default_working_capacity() -> usize {
    7
}
fn default_consolidation_threshold() -> f64 {
    70.0
}
fn default_decay_rate() -> f64 {
    0.1
}
fn default_min_strength() -> f64 {
    10.0
}
fn default_reinforcement_bonus() -> f64 {
    20.0
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            working_capacity: default_working_capacity(),
            consolidation_threshold: default_consolidation_threshold(),
            decay_rate: default_decay_rate(),
            min_strength: default_min_strength(),
            reinforcement_bonus: default_reinforcement_bonus(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Token budget of the assembled context window
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_max_tokens() -> usize {
    8000
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Messages kept in the active view
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// Momentum of a fresh conversation
    #[serde(default = "default_initial_momentum")]
    pub initial_momentum: u8,
}

fn default_recent_window() -> usize {
    20
}
fn default_initial_momentum() -> u8 {
    50
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            initial_momentum: default_initial_momentum(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// JSON file holding every task
    #[serde(default = "default_task_store")]
    pub store_path: PathBuf,

    /// Scores below this add a warning to the (still completed) task
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,
}

fn default_task_store() -> PathBuf {
    AppConfig::config_dir().join("tasks.json")
}
fn default_pass_threshold() -> u8 {
    80
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            store_path: default_task_store(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    /// The two rule documents, relative to the working directory
    #[serde(default = "default_rules_files")]
    pub rules_files: Vec<PathBuf>,

    /// The project changelog
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
}

fn default_rules_files() -> Vec<PathBuf> {
    vec![PathBuf::from("RULES.md"), PathBuf::from("docs/STANDARDS.md")]
}
fn default_history_file() -> PathBuf {
    PathBuf::from("CHANGELOG.md")
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            rules_files: default_rules_files(),
            history_file: default_history_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// Extra rules appended after the validation checklist
    #[serde(default)]
    pub extra_rules: Vec<String>,

    /// Surface used when the caller names none
    #[serde(default = "default_surface")]
    pub default_surface: String,
}

fn default_surface() -> String {
    "claude".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            extra_rules: vec![],
            default_surface: default_surface(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(MAX_TOKENS_ENV) {
            self.context.max_tokens = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{MAX_TOKENS_ENV} must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        match std::env::var(HOME_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs_home().join(".ctxforge"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.working_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "memory.working_capacity must be at least 1".into(),
            ));
        }

        for (name, value) in [
            ("memory.consolidation_threshold", self.memory.consolidation_threshold),
            ("memory.min_strength", self.memory.min_strength),
            ("memory.reinforcement_bonus", self.memory.reinforcement_bonus),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0 and 100"
                )));
            }
        }

        if !self.memory.decay_rate.is_finite() || self.memory.decay_rate < 0.0 {
            return Err(ConfigError::ValidationError(
                "memory.decay_rate must be a non-negative number".into(),
            ));
        }

        if self.context.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_tokens must be > 0".into(),
            ));
        }

        if self.conversation.recent_window == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.recent_window must be at least 1".into(),
            ));
        }

        if self.conversation.initial_momentum > 100 {
            return Err(ConfigError::ValidationError(
                "conversation.initial_momentum must be between 0 and 100".into(),
            ));
        }

        if self.tasks.pass_threshold > 100 {
            return Err(ConfigError::ValidationError(
                "tasks.pass_threshold must be between 0 and 100".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `setup` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            context: ContextConfig::default(),
            conversation: ConversationConfig::default(),
            tasks: TaskConfig::default(),
            sources: SourcesConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
