//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::youtube::extract_video_id;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, user_id: i64, video: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubechat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let video_id = extract_video_id(video)?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching transcript...");
    let result = orchestrator.chat(user_id, &video_id, question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("\n{}\n", answer);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
