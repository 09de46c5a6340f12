//! Doctor command - verify configuration and credentials.

use crate::cli::Output;
use crate::config::{Settings, VectorStoreProvider};
use console::style;
use std::path::{Path, PathBuf};

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(config_path: Option<PathBuf>, settings: &Settings) -> anyhow::Result<()> {
    Output::header("Tubechat Doctor");
    println!();
    println!("Checking configuration and credentials...\n");

    let lookup = |key: &str| std::env::var(key).ok();
    let mut checks = Vec::new();

    let sections = [
        ("API Configuration", vec![check_openai_api_key(lookup("OPENAI_API_KEY"))]),
        ("Vector Store", check_vector_store(settings, lookup("PINECONE_API_KEY"))),
        ("Storage", check_storage(settings)),
        (
            "Configuration",
            vec![check_config_file(
                &config_path.unwrap_or_else(Settings::default_config_path),
            )],
        ),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Tubechat.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Tubechat is ready to use.");
    }

    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Some(key) if key.trim().is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Fine for OpenAI-compatible servers set via OPENAI_BASE_URL",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// First 7 and last 4 characters of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check the configured vector index backend.
fn check_vector_store(settings: &Settings, pinecone_key: Option<String>) -> Vec<CheckResult> {
    let provider = settings.vector_store.provider;
    let mut results = vec![CheckResult::ok("Provider", &provider.to_string())];

    match provider {
        VectorStoreProvider::Sqlite => {
            let path = settings.sqlite_path();
            results.push(check_file("Vector index", &path, "Created on first ingest"));
        }
        VectorStoreProvider::Memory => {
            results.push(CheckResult::warning(
                "Vector index",
                "in memory",
                "Indexed chunks are lost on restart; use sqlite or pinecone to keep them",
            ));
        }
        VectorStoreProvider::Pinecone => {
            results.push(match &settings.vector_store.pinecone_index_host {
                Some(host) => CheckResult::ok("Index host", host),
                None => CheckResult::error(
                    "Index host",
                    "not set",
                    "Set PINECONE_INDEX_HOST or vector_store.pinecone_index_host",
                ),
            });
            results.push(match pinecone_key {
                Some(key) if !key.trim().is_empty() => {
                    CheckResult::ok("PINECONE_API_KEY", "configured")
                }
                _ => CheckResult::error(
                    "PINECONE_API_KEY",
                    "not set",
                    "Set with: export PINECONE_API_KEY='...'",
                ),
            });
        }
    }

    results
}

/// Check data directory and database.
fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &data_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    results.push(check_file(
        "Database",
        &settings.database_path(),
        "Created on first use",
    ));

    results
}

fn check_file(name: &str, path: &Path, hint: &str) -> CheckResult {
    if path.exists() {
        let size = std::fs::metadata(path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        CheckResult::ok(name, &format!("{} ({})", path.display(), size))
    } else {
        CheckResult::warning(name, &format!("{} (not created yet)", path.display()), hint)
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubechat config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
