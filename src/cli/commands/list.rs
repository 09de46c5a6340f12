//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::db::Database;
use anyhow::Result;

/// Run the list command.
pub fn run_list(user_id: i64, settings: Settings) -> Result<()> {
    let database = Database::open(&settings.database_path())?;

    match database.list_videos(user_id) {
        Ok(videos) if videos.is_empty() => {
            Output::info(&format!(
                "No videos ingested for user {} yet. Use 'tubechat ingest <url> --user {}' to add one.",
                user_id, user_id
            ));
        }
        Ok(videos) => {
            Output::header(&format!("Videos of user {} ({})", user_id, videos.len()));
            println!();
            for video in &videos {
                Output::video_info(video);
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
