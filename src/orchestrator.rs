//! Pipeline orchestrator for Tubechat.
//!
//! Sequences the components behind each operation: ingesting a video, listing
//! videos, answering a chat turn, reading chat history and managing users.

use crate::chunking::TranscriptChunker;
use crate::config::{Prompts, Settings, VectorStoreProvider};
use crate::db::{hash_password, ChatMessage, Database, NewUser, Role, User, Video};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubechatError};
use crate::rag::{ChatModel, ContextBuilder, OpenAIChatModel, RagEngine};
use crate::vector_store::{
    Document, MemoryVectorStore, PineconeVectorStore, SqliteVectorStore, VectorStore,
};
use crate::youtube::{extract_video_id, TranscriptFetcher, YoutubeTranscriptFetcher};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The pluggable parts of the pipeline.
pub struct Components {
    pub database: Arc<Database>,
    pub transcripts: Arc<dyn TranscriptFetcher>,
    pub embedder: Arc<dyn Embedder>,
    pub vector_store: Arc<dyn VectorStore>,
    pub chat_model: Arc<dyn ChatModel>,
}

/// The main orchestrator for the Tubechat pipeline.
pub struct Orchestrator {
    settings: Settings,
    database: Arc<Database>,
    transcripts: Arc<dyn TranscriptFetcher>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    chunker: TranscriptChunker,
    rag: RagEngine,
}

impl Orchestrator {
    /// Create a new orchestrator with the components named in settings.
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let components = Components {
            database: Arc::new(Database::open(&settings.database_path())?),
            transcripts: Arc::new(YoutubeTranscriptFetcher::new(&settings.youtube)?),
            embedder: Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?),
            vector_store: create_vector_store(&settings)?,
            chat_model: Arc::new(OpenAIChatModel::from_settings(&settings.generation)?),
        };

        Self::with_components(settings, prompts, components)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        components: Components,
    ) -> Result<Self> {
        let chunker = TranscriptChunker::from_settings(&settings.chunking)?;

        let context_builder = ContextBuilder::from_settings(
            components.vector_store.clone(),
            components.embedder.clone(),
            &settings.rag,
        );
        let rag = RagEngine::new(context_builder, components.chat_model).with_prompts(prompts);

        info!(
            vector_store = components.vector_store.name(),
            "Orchestrator ready"
        );

        Ok(Self {
            settings,
            database: components.database,
            transcripts: components.transcripts,
            embedder: components.embedder,
            vector_store: components.vector_store,
            chunker,
            rag,
        })
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the relational store.
    pub fn database(&self) -> Arc<Database> {
        self.database.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // === Videos ===

    /// Ingest a video: fetch its transcript, index the chunks and record it.
    ///
    /// Re-ingesting a video the owner already has returns the existing record
    /// with `skipped` set, without touching either store.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn ingest_video(&self, url: &str, owner_id: i64) -> Result<IngestResult> {
        let video_id = extract_video_id(url)?;
        self.require_user(owner_id)?;

        if let Some(existing) = self.database.find_video(owner_id, &video_id)? {
            info!("Video {} already ingested for user {}", video_id, owner_id);
            return Ok(IngestResult::skipped(existing));
        }

        let transcript = self.transcripts.fetch(&video_id).await?;
        info!(
            segments = transcript.segments.len(),
            duration_secs = transcript.duration_seconds(),
            "Fetched transcript"
        );
        let text = transcript.full_text();
        if text.trim().is_empty() {
            return Err(TubechatError::TranscriptUnavailable {
                video_id,
                reason: "transcript is empty".to_string(),
            });
        }

        let chunks = self.chunker.chunk(&text, owner_id, &video_id);
        info!("Split transcript into {} chunks", chunks.len());

        let ids = self
            .index_chunks(chunks)
            .await
            .map_err(|e| ingest_failure("indexing chunks", e))?;

        match self.database.insert_video(owner_id, url, &video_id, &text) {
            Ok(video) => {
                info!("Ingested video {} for user {}", video_id, owner_id);
                Ok(IngestResult {
                    video,
                    chunks_indexed: ids.len(),
                    skipped: false,
                })
            }
            // A concurrent ingest won the race; its vectors share our deterministic ids
            Err(TubechatError::AlreadyExists(_)) => {
                let existing = self.database.find_video(owner_id, &video_id)?.ok_or_else(|| {
                    TubechatError::IngestFailure(format!(
                        "Video {} vanished after a conflicting insert",
                        video_id
                    ))
                })?;
                Ok(IngestResult::skipped(existing))
            }
            Err(e) => {
                self.remove_vectors(&ids).await;
                Err(ingest_failure("saving video record", e))
            }
        }
    }

    /// Embed chunks and upsert them into the vector index.
    async fn index_chunks(
        &self,
        chunks: Vec<crate::chunking::ContentChunk>,
    ) -> Result<Vec<Uuid>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(TubechatError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::new(chunk, embedding))
            .collect();
        let ids: Vec<Uuid> = documents.iter().map(|d| d.id).collect();

        self.vector_store.upsert_batch(&documents).await?;
        Ok(ids)
    }

    /// Best-effort removal of vectors written by a failed ingest.
    async fn remove_vectors(&self, ids: &[Uuid]) {
        match self.vector_store.delete(ids).await {
            Ok(deleted) => warn!("Rolled back {} indexed chunks", deleted),
            Err(e) => error!(
                "Failed to roll back {} indexed chunks, re-ingest to repair: {}",
                ids.len(),
                e
            ),
        }
    }

    /// All videos ingested by an owner.
    pub fn list_videos(&self, owner_id: i64) -> Result<Vec<Video>> {
        self.database.list_videos(owner_id)
    }

    // === Chat ===

    /// Answer a question about a video and record both turns.
    #[instrument(skip(self, question))]
    pub async fn chat(&self, owner_id: i64, video_id: &str, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TubechatError::InvalidInput(
                "Query must not be empty".to_string(),
            ));
        }

        self.require_user(owner_id)?;
        if self.database.find_video(owner_id, video_id)?.is_none() {
            return Err(TubechatError::VideoNotFound {
                user_id: owner_id,
                video_id: video_id.to_string(),
            });
        }

        let user_message = self
            .database
            .insert_message(owner_id, video_id, Role::User, question)?;

        let response = match self.rag.answer(owner_id, video_id, question).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Answer generation failed, discarding question: {}", e);
                if let Err(cleanup) = self.database.delete_message(user_message.id) {
                    error!("Failed to remove orphaned question {}: {}", user_message.id, cleanup);
                }
                return Err(e);
            }
        };

        self.database
            .insert_message(owner_id, video_id, Role::Assistant, &response.answer)?;

        Ok(response.answer)
    }

    /// Conversation about a video, oldest first.
    pub fn chat_history(&self, owner_id: i64, video_id: &str) -> Result<Vec<ChatMessage>> {
        self.database.history(owner_id, video_id)
    }

    // === Users ===

    /// Register a user with a hashed password.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register_user(&self, new_user: NewUser) -> Result<User> {
        let NewUser {
            name,
            email,
            password,
        } = new_user.validated()?;

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| TubechatError::PasswordHash(e.to_string()))??;

        let user = self.database.insert_user(&name, &email, &password_hash)?;
        info!(user_id = user.id, "Registered user");
        Ok(user)
    }

    /// Look up a user by id.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.database
            .get_user(id)?
            .ok_or(TubechatError::UserNotFound(id))
    }

    /// All registered users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.database.list_users()
    }

    fn require_user(&self, id: i64) -> Result<()> {
        self.get_user(id).map(|_| ())
    }
}

/// Build the vector index backend named in settings.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
        VectorStoreProvider::Pinecone => {
            let host = settings
                .vector_store
                .pinecone_index_host
                .as_deref()
                .ok_or_else(|| {
                    TubechatError::Config(
                        "vector_store.pinecone_index_host (or PINECONE_INDEX_HOST) is required"
                            .to_string(),
                    )
                })?;
            Arc::new(PineconeVectorStore::from_env(
                host,
                settings.vector_store.pinecone_namespace.clone(),
            )?)
        }
    };
    Ok(store)
}

fn ingest_failure(stage: &str, e: TubechatError) -> TubechatError {
    error!("Ingest failed while {}: {}", stage, e);
    TubechatError::IngestFailure(format!("{}: {}", stage, e))
}

/// Result of ingesting a video.
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// The stored video record.
    pub video: Video,
    /// Number of chunks indexed by this call.
    pub chunks_indexed: usize,
    /// Whether ingestion was skipped (already ingested).
    pub skipped: bool,
}

impl IngestResult {
    fn skipped(video: Video) -> Self {
        Self {
            video,
            chunks_indexed: 0,
            skipped: true,
        }
    }
}
