//! History command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::db::Database;
use crate::youtube::extract_video_id;
use anyhow::Result;

/// Run the history command.
pub fn run_history(user_id: i64, video: &str, settings: Settings) -> Result<()> {
    let video_id = extract_video_id(video)?;
    let database = Database::open(&settings.database_path())?;
    let messages = database.history(user_id, &video_id)?;

    if messages.is_empty() {
        Output::info(&format!(
            "No conversation yet about {} for user {}.",
            video_id, user_id
        ));
        return Ok(());
    }

    Output::header(&format!("Conversation about {} ({} messages)", video_id, messages.len()));
    for message in &messages {
        Output::chat_message(message);
    }
    println!();

    Ok(())
}
