//! Knowledge-base ingestion and one-shot questions.

use std::path::Path;

use tracing::info;

use merchant_assistant::config::AssistantConfig;
use merchant_assistant::state::AppState;

/// Ingest one document into the knowledge base.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the file cannot be
/// read, or ingestion fails.
pub async fn ingest(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AssistantConfig::from_env()?;
    let state = AppState::connect(&config).await?;

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("Not a file path: {}", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path).await?;

    let report = state.knowledge().ingest_file(&filename, bytes).await?;
    info!(
        document_id = %report.document.id,
        filename = %report.document.filename,
        chunks = report.chunk_count,
        "Document ingested"
    );
    Ok(())
}

/// Run the assistant once and print its answer to stdout.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the run fails.
pub async fn ask(question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let question = question.trim();
    if question.is_empty() {
        return Err("Question is empty".into());
    }

    let config = AssistantConfig::from_env()?;
    let state = AppState::connect(&config).await?;

    let output = state
        .orchestrator()
        .run(question, Vec::new(), state.shutdown())
        .await?;
    info!(model_calls = output.model_calls, "Run complete");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", output.answer);
    }
    Ok(())
}
