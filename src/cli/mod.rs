//! CLI module for Tubechat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubechat - chat with YouTube videos
///
/// Ingests video transcripts into a searchable index and answers questions about
/// them, from the command line or over HTTP.
#[derive(Parser, Debug)]
#[command(name = "tubechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TUBECHAT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log level for the `-v` count, falling back to the configured level.
pub fn log_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch, index and store a video's transcript
    Ingest {
        /// YouTube URL or video id
        url: String,

        /// Owner user id
        #[arg(short, long)]
        user: i64,
    },

    /// List a user's ingested videos
    List {
        /// Owner user id
        #[arg(short, long)]
        user: i64,
    },

    /// Ask a question about an ingested video
    Ask {
        /// The question to ask
        question: String,

        /// Owner user id
        #[arg(short, long)]
        user: i64,

        /// Video id (or URL) of an ingested video
        #[arg(long)]
        video: String,
    },

    /// Show the chat history for a video
    History {
        /// Owner user id
        #[arg(short, long)]
        user: i64,

        /// Video id (or URL) of an ingested video
        #[arg(long)]
        video: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Check configuration and connectivity requirements
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a new user
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address (must be unique)
        #[arg(long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(long, env = "TUBECHAT_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show a user
    Show {
        /// User id
        id: i64,
    },

    /// List all users
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "tubechat",
            "-vv",
            "ask",
            "what is this about?",
            "--user",
            "3",
            "--video",
            "abc123XYZ_9",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask {
                question,
                user,
                video,
            } => {
                assert_eq!(question, "what is this about?");
                assert_eq!(user, 3);
                assert_eq!(video, "abc123XYZ_9");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_user_add() {
        let cli = Cli::parse_from([
            "tubechat",
            "user",
            "add",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--password",
            "hunter2hunter2",
        ]);

        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::Add { .. }
            }
        ));
    }

    #[test]
    fn test_verbosity_overrides_configured_level() {
        assert_eq!(log_level(0, "error"), "error");
        assert_eq!(log_level(1, "error"), "info");
        assert_eq!(log_level(5, "error"), "trace");
    }

    #[test]
    fn test_ingest_requires_user() {
        assert!(Cli::try_parse_from(["tubechat", "ingest", "abc123XYZ_9"]).is_err());
    }
}
