//! Ingest command implementation.

use crate::cli::output::content_preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(url: &str, user_id: i64, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubechat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and indexing...");
    let result = orchestrator.ingest_video(url, user_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) if result.skipped => {
            Output::warning(&format!(
                "Video {} already exists for user {}",
                result.video.video_id, user_id
            ));
        }
        Ok(result) => {
            Output::success(&format!(
                "Ingested {} ({} chunks indexed)",
                result.video.video_id, result.chunks_indexed
            ));
            Output::kv("Preview", &content_preview(&result.video.transcript, 120));
        }
        Err(e) => {
            Output::error(&format!("Failed to ingest video: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
