//! Configuration settings for Tubechat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub youtube: YoutubeSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error) used when no `-v` flag is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubechat".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database holding users, videos and chat messages.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.tubechat/tubechat.db".to_string(),
        }
    }
}

/// YouTube caption fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Base URL of the YouTube frontend.
    pub base_url: String,
    /// Caption languages in order of preference.
    pub languages: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            languages: vec!["en".to_string()],
            timeout_seconds: 30,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// OpenAI-compatible API base URL (defaults to OpenAI).
    pub api_base: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_base: None,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chat model used to answer questions.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// OpenAI-compatible API base URL (defaults to OpenAI).
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            api_base: None,
            timeout_seconds: 300,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive windows.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Embedded SQLite index (default).
    #[default]
    Sqlite,
    /// Process-local index, lost on restart.
    Memory,
    /// Managed Pinecone index.
    Pinecone,
}

impl std::str::FromStr for VectorStoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(VectorStoreProvider::Sqlite),
            "memory" => Ok(VectorStoreProvider::Memory),
            "pinecone" => Ok(VectorStoreProvider::Pinecone),
            _ => Err(format!("Unknown vector store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for VectorStoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorStoreProvider::Sqlite => write!(f, "sqlite"),
            VectorStoreProvider::Memory => write!(f, "memory"),
            VectorStoreProvider::Pinecone => write!(f, "pinecone"),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    /// Path to the SQLite vector index (for the sqlite provider).
    pub sqlite_path: String,
    /// Index host, e.g. `https://youtube-rag-abc123.svc.us-east-1.pinecone.io`.
    pub pinecone_index_host: Option<String>,
    /// Pinecone namespace (empty string is the default namespace).
    pub pinecone_namespace: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Sqlite,
            sqlite_path: "~/.tubechat/vectors.db".to_string(),
            pinecone_index_host: None,
            pinecone_namespace: String::new(),
        }
    }
}

/// How chunks are ranked for the answer context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Top-k by cosine similarity.
    Similarity,
    /// Maximal marginal relevance over a larger candidate pool.
    #[default]
    Mmr,
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub search_type: SearchType,
    /// Number of chunks placed in the context.
    pub k: usize,
    /// Candidate pool size for MMR.
    pub fetch_k: usize,
    /// MMR trade-off: 1.0 is pure relevance, 0.0 pure diversity.
    pub lambda_mult: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            search_type: SearchType::Mmr,
            k: 8,
            fetch_k: 20,
            lambda_mult: 0.5,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Override file values with environment variables.
    ///
    /// Takes a lookup function so tests don't have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("TUBECHAT_DATABASE_PATH").or_else(|| non_empty("DATABASE_URL")) {
            self.database.path = path
                .strip_prefix("sqlite://")
                .or_else(|| path.strip_prefix("sqlite:"))
                .unwrap_or(&path)
                .to_string();
        }

        if let Some(base) = non_empty("OPENAI_BASE_URL") {
            self.embedding.api_base.get_or_insert_with(|| base.clone());
            self.generation.api_base.get_or_insert(base);
        }

        if let Some(host) = non_empty("PINECONE_INDEX_HOST") {
            self.vector_store.pinecone_index_host = Some(host);
        }

        if let Some(provider) = non_empty("TUBECHAT_VECTOR_STORE") {
            match provider.parse() {
                Ok(p) => self.vector_store.provider = p,
                Err(e) => tracing::warn!("Ignoring TUBECHAT_VECTOR_STORE: {}", e),
            }
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TubechatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubechat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded relational database path.
    pub fn database_path(&self) -> PathBuf {
        Self::expand_path(&self.database.path)
    }

    /// Get the expanded SQLite vector index path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_retrieval_parameters() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.rag.k, 8);
        assert_eq!(settings.rag.fetch_k, 20);
        assert_eq!(settings.rag.search_type, SearchType::Mmr);
        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Sqlite);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite:///var/lib/tubechat/app.db"),
            ("OPENAI_BASE_URL", "https://llm.example.com/v1"),
            ("PINECONE_INDEX_HOST", "https://idx.pinecone.io"),
            ("TUBECHAT_VECTOR_STORE", "pinecone"),
        ]);

        let mut settings = Settings::default();
        settings.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.database.path, "/var/lib/tubechat/app.db");
        assert_eq!(
            settings.generation.api_base.as_deref(),
            Some("https://llm.example.com/v1")
        );
        assert_eq!(
            settings.embedding.api_base.as_deref(),
            Some("https://llm.example.com/v1")
        );
        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Pinecone);
        assert_eq!(
            settings.vector_store.pinecone_index_host.as_deref(),
            Some("https://idx.pinecone.io")
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [rag]
            search_type = "similarity"
            k = 4

            [vector_store]
            provider = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.rag.search_type, SearchType::Similarity);
        assert_eq!(settings.rag.k, 4);
        assert_eq!(settings.rag.fetch_k, 20);
        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Memory);
        assert_eq!(settings.chunking.chunk_size, 1000);
    }
}
