//! `ctxforge prompt <surface> [text]`: compose a context-aware prompt.

use super::CommandContext;
use tokio::io::AsyncReadExt;

pub async fn run(
    ctx: &CommandContext,
    surface: &str,
    text: Option<String>,
    current_file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let text = text.trim();
    if text.is_empty() {
        return Err("Nothing to compose: pass the request text or pipe it on stdin".into());
    }

    let mut engine = ctx.open_engine().await?;
    if let Some(file) = &current_file {
        engine.record_file_change(file.clone());
    }
    let outcome = engine.submit_prompt(surface, text, current_file.as_deref());
    tracing::info!(
        surface = %outcome.surface,
        context_tokens = outcome.context.window.current_tokens(),
        utilization = outcome.context.window.utilization(),
        "Prompt ready"
    );
    println!("{}", outcome.prompt);

    ctx.close_engine(engine).await;
    Ok(())
}
