//! `ctxforge validate <file>`: score generated output.

use super::CommandContext;
use ctxforge_core::TaskKind;
use std::path::Path;

pub async fn run(
    ctx: &CommandContext,
    file: &Path,
    kind: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: TaskKind = kind.parse()?;
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("Could not read {}: {e}", file.display()))?;

    let config = ctx.load_config()?;
    let engine = ctxforge_agent::Engine::new(config);
    let report = engine.validate_output(&text, kind);
    let threshold = engine.tasks().pass_threshold();

    println!("Score: {}/100 ({kind})", report.score);
    if report.warnings.is_empty() {
        println!("✅ No violations");
    }
    for warning in &report.warnings {
        println!("  ⚠️  {warning}");
    }
    if !report.passed(threshold) {
        println!("Below the pass threshold of {threshold}");
    }
    Ok(())
}
