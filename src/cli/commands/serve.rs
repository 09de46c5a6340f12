//! HTTP API server command.

use crate::api;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubechat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let orchestrator = Arc::new(Orchestrator::new(settings)?);

    Output::header("Tubechat API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    Output::kv("Vector store", orchestrator.vector_store().name());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ingest video", "POST /url");
    Output::kv("List videos", "GET  /get-url/{user_id}");
    Output::kv("Chat", "POST /chat/{user_id}/{video_id}");
    Output::kv("Chat history", "GET  /chat-history/{user_id}/{video_id}");
    Output::kv("Users", "POST /users, GET /users, GET /users/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    api::serve(orchestrator, &host, port).await?;

    Ok(())
}
