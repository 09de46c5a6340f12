//! CLI output formatting utilities.

use crate::db::{ChatMessage, Role, User, Video};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a video line.
    pub fn video_info(video: &Video) {
        println!(
            "  {} {} ({}, {} words, added {})",
            style("*").cyan(),
            style(&video.video_id).bold(),
            style(&video.url).dim(),
            video.transcript.split_whitespace().count(),
            video.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    /// Print a user line.
    pub fn user_info(user: &User) {
        println!(
            "  {} {} {} <{}>",
            style("*").cyan(),
            style(format!("#{}", user.id)).dim(),
            style(&user.name).bold(),
            user.email
        );
    }

    /// Print one turn of a conversation.
    pub fn chat_message(message: &ChatMessage) {
        let speaker = match message.role {
            Role::User => style("you").cyan().bold(),
            Role::Assistant => style("assistant").green().bold(),
        };
        println!(
            "\n{} {}\n{}",
            speaker,
            style(message.created_at.format("%Y-%m-%d %H:%M:%S")).dim(),
            message.content
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, on a character boundary.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short", 10), "short");
        assert_eq!(content_preview("line\nbreak", 20), "line break");
        assert_eq!(content_preview("æøå and more", 3), "æøå...");
    }
}
