//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::{Settings, VectorStoreProvider};
use crate::error::{Result, TubechatError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingesting needs embeddings and the vector index.
    Ingest,
    /// Asking needs embeddings, generation and the vector index.
    Ask,
    /// The server runs every operation.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_with(operation, settings, |key| std::env::var(key).ok())
}

fn check_with<F>(operation: Operation, settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match operation {
        Operation::Ingest | Operation::Ask | Operation::Serve => {
            check_api_key(&lookup)?;
            check_vector_store(settings, &lookup)?;
        }
    }
    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_api_key<F: Fn(&str) -> Option<String>>(lookup: &F) -> Result<()> {
    match lookup("OPENAI_API_KEY") {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(TubechatError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(TubechatError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check the credentials of the configured vector index.
fn check_vector_store<F: Fn(&str) -> Option<String>>(settings: &Settings, lookup: &F) -> Result<()> {
    if settings.vector_store.provider != VectorStoreProvider::Pinecone {
        return Ok(());
    }

    if settings.vector_store.pinecone_index_host.is_none() {
        return Err(TubechatError::Config(
            "Pinecone index host not set. Set PINECONE_INDEX_HOST or vector_store.pinecone_index_host"
                .to_string(),
        ));
    }

    match lookup("PINECONE_API_KEY") {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(TubechatError::Config(
            "PINECONE_API_KEY not set. Set it with: export PINECONE_API_KEY='...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_ask_needs_api_key() {
        let settings = Settings::default();
        assert!(check_with(Operation::Ask, &settings, env(&[])).is_err());
        assert!(check_with(Operation::Ask, &settings, env(&[("OPENAI_API_KEY", " ")])).is_err());
        assert!(check_with(Operation::Ask, &settings, env(&[("OPENAI_API_KEY", "sk-test")])).is_ok());
    }

    #[test]
    fn test_pinecone_needs_host_and_key() {
        let mut settings = Settings::default();
        settings.vector_store.provider = VectorStoreProvider::Pinecone;

        let with_openai = env(&[("OPENAI_API_KEY", "sk-test")]);
        assert!(check_with(Operation::Ingest, &settings, with_openai).is_err());

        settings.vector_store.pinecone_index_host = Some("idx.pinecone.io".to_string());
        let with_openai = env(&[("OPENAI_API_KEY", "sk-test")]);
        assert!(check_with(Operation::Ingest, &settings, with_openai).is_err());

        let both = env(&[("OPENAI_API_KEY", "sk-test"), ("PINECONE_API_KEY", "pc")]);
        assert!(check_with(Operation::Ingest, &settings, both).is_ok());
    }
}
