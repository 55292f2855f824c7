//! `ctxforge setup`: first-time setup and a source check.

use super::CommandContext;
use ctxforge_config::AppConfig;

pub async fn run(ctx: &CommandContext) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = ctx
        .config_path
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));

    println!("ctxforge setup");
    println!("==============\n");

    if !config_dir.exists() {
        tokio::fs::create_dir_all(&config_dir).await?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config already exists at: {}", config_path.display());
    } else {
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&config_path, AppConfig::default_toml()).await?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let engine = ctx.open_engine().await?;
    let config = engine.config();
    println!("\nMemory snapshots: {}", config.memory.snapshot_dir.display());
    println!("Task store:       {}", config.tasks.store_path.display());

    let sources = engine.sources();
    println!("\nProject sources (root: {})", ctx.root.display());
    if sources.rules.is_empty() {
        println!("  Rules:   none found; prompts use the built-in standards");
    }
    for rules in &sources.rules {
        println!(
            "  Rules:   {} ({} forbidden, {} required patterns)",
            rules.source,
            rules.forbidden_patterns.len(),
            rules.required_patterns.len()
        );
    }
    let history = &sources.history;
    if history.is_empty() {
        println!("  History: none found");
    } else {
        println!(
            "  History: {} {} ({} milestones)",
            history.name,
            history.version,
            history.milestones.len()
        );
    }
    for warning in &sources.warnings {
        println!("  ⚠️  {warning}");
    }

    let memory = engine.memory();
    println!(
        "\nMemory: {} working, {} concepts, {} patterns, {} procedures",
        memory.working().len(),
        memory.semantic().concepts.len(),
        memory.semantic().patterns.len(),
        memory.procedural().procedures.len()
    );
    println!("Tasks:  {}", engine.tasks().len());

    ctx.close_engine(engine).await;
    println!("\n✅ Ready. Try: ctxforge prompt claude \"Build a pricing card\"");
    Ok(())
}
