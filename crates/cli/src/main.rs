//! ctxforge CLI: the main entry point.
//!
//! Commands:
//! - `setup`                     Initialize config, snapshots, and read project sources
//! - `prompt <surface> [text]`   Compose a context-aware prompt for an assistant surface
//! - `task create|list|activate|execute`  Manage tasks
//! - `validate <file>`           Score generated output against the standards

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::task::{PriorityArg, StatusArg};

#[derive(Parser)]
#[command(
    name = "ctxforge",
    about = "ctxforge: context-aware prompts for AI coding assistants",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.ctxforge/config.toml)
    #[arg(long, global = true, env = "CTXFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Project root holding the rule documents and changelog
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and default config, then check project sources
    Setup,

    /// Compose a prompt for an assistant surface (cursor, copilot, claude, chatgpt)
    Prompt {
        /// Target surface; unknown names pass the prompt through unwrapped
        surface: String,

        /// Request text; read from stdin when omitted
        text: Option<String>,

        /// File currently being edited
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Score a file of generated output
    Validate {
        file: PathBuf,

        /// Task kind to score against
        #[arg(short, long, default_value = "create_component")]
        kind: String,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Create a pending task
    Create {
        /// One of create_component, create_page, create_feature, update_styles,
        /// fix_bug, refactor, add_tests, add_translations, improve_accessibility
        #[arg(short, long)]
        kind: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(long)]
        component: Option<String>,

        #[arg(long)]
        feature: Option<String>,

        /// Target directory for generated files
        #[arg(long)]
        target: Option<String>,

        /// Requirement folded into the prompt (repeatable)
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,

        /// Affected file (repeatable)
        #[arg(long = "affects")]
        affected_files: Vec<String>,

        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,

        /// Also mark the new task active
        #[arg(long)]
        activate: bool,
    },

    /// List tasks
    List {
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Print the tasks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fold a task's requirements into subsequent prompts
    Activate { id: String },

    /// Execute a pending task, taking the generated output from a file
    Execute {
        id: String,

        /// File holding the assistant's output
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::CommandContext {
        config_path: cli.config,
        root: cli.root,
    };

    match cli.command {
        Commands::Setup => commands::setup::run(&ctx).await?,
        Commands::Prompt {
            surface,
            text,
            file,
        } => commands::prompt::run(&ctx, &surface, text, file).await?,
        Commands::Task(TaskCommand::Create {
            kind,
            title,
            description,
            component,
            feature,
            target,
            requirements,
            affected_files,
            priority,
            activate,
        }) => {
            let args = commands::task::CreateArgs {
                kind,
                title,
                description,
                component,
                feature,
                target,
                requirements,
                affected_files,
                priority,
                activate,
            };
            commands::task::create(&ctx, args).await?
        }
        Commands::Task(TaskCommand::List { status, json }) => {
            commands::task::list(&ctx, status, json).await?
        }
        Commands::Task(TaskCommand::Activate { id }) => commands::task::activate(&ctx, &id).await?,
        Commands::Task(TaskCommand::Execute { id, output }) => {
            commands::task::execute(&ctx, &id, output).await?
        }
        Commands::Validate { file, kind } => commands::validate::run(&ctx, &file, &kind).await?,
    }

    Ok(())
}
