//! Pinecone vector store implementation.
//!
//! Talks to a serverless index over its data-plane REST API. Owner and video
//! are stored as metadata and every query carries an equality filter on both.
//! Serverless indexes ignore filters on `describe_index_stats`, so counts are
//! taken by fetching the deterministic chunk ids instead.

use super::{document_id, ChunkFilter, Document, SearchResult, VectorStore};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const API_VERSION: &str = "2024-07";
const UPSERT_BATCH_SIZE: usize = 100;
const DELETE_BATCH_SIZE: usize = 1000;
const FETCH_BATCH_SIZE: i32 = 100;

/// Pinecone-backed vector store.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    host: String,
    api_key: String,
    namespace: String,
}

impl PineconeVectorStore {
    /// Create a store for the index at `host`.
    ///
    /// A host without a scheme is assumed to be served over https.
    pub fn new(host: &str, api_key: impl Into<String>, namespace: impl Into<String>) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(TubechatError::Config(
                "Pinecone index host is not set".to_string(),
            ));
        }

        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TubechatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host,
            api_key: api_key.into(),
            namespace: namespace.into(),
        })
    }

    /// Create a store from the `PINECONE_API_KEY` environment variable.
    pub fn from_env(host: &str, namespace: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TubechatError::Config("PINECONE_API_KEY is not set".to_string()))?;
        Self::new(host, api_key, namespace)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let request = self.client.post(format!("{}{}", self.host, path)).json(body);
        self.send(path, request).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.client.get(format!("{}{}", self.host, path)).query(query);
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| TubechatError::VectorStore(format!("Pinecone request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TubechatError::VectorStore(format!(
                "Pinecone returned {} for {}: {}",
                status, path, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TubechatError::VectorStore(format!("Invalid Pinecone response: {}", e)))
    }

    fn filter_json(filter: &ChunkFilter) -> Value {
        json!({
            "user_id": { "$eq": filter.owner_id },
            "video_id": { "$eq": filter.video_id },
        })
    }
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        for batch in docs.chunks(UPSERT_BATCH_SIZE) {
            let vectors: Vec<WireVector> = batch.iter().map(WireVector::from).collect();
            let body = json!({ "vectors": vectors, "namespace": self.namespace });

            let response: UpsertResponse = self.post("/vectors/upsert", &body).await?;
            debug!("Pinecone upserted {} vectors", response.upserted_count);
        }

        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let body = json!({
            "vector": query_embedding,
            "topK": limit,
            "filter": Self::filter_json(filter),
            "includeValues": true,
            "includeMetadata": true,
            "namespace": self.namespace,
        });

        let response: QueryResponse = self.post("/query", &body).await?;

        let results: Vec<SearchResult> = response
            .matches
            .into_iter()
            .filter_map(|m| {
                let id = Uuid::parse_str(&m.id).ok()?;
                let metadata = m.metadata?;
                let document = Document {
                    id,
                    owner_id: metadata.user_id as i64,
                    video_id: metadata.video_id,
                    content: metadata.text,
                    chunk_order: metadata.chunk_order as i32,
                    embedding: m.values,
                    indexed_at: Utc::now(),
                };
                // Never hand back a chunk outside the filter, whatever the index returned
                filter.matches(&document).then_some(SearchResult {
                    document,
                    score: m.score,
                })
            })
            .collect();

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete(&self, ids: &[Uuid]) -> Result<usize> {
        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            let ids: Vec<String> = batch.iter().map(Uuid::to_string).collect();
            let body = json!({ "ids": ids, "namespace": self.namespace });
            let _: Value = self.post("/vectors/delete", &body).await?;
        }

        info!("Deleted {} documents", ids.len());
        Ok(ids.len())
    }

    /// Fetches chunk ids for orders 0, 1, 2, ... until a batch comes back short.
    ///
    /// Ingest writes every chunk of a video in one upsert, so orders are contiguous.
    async fn count(&self, filter: &ChunkFilter) -> Result<usize> {
        let mut total = 0;
        let mut start = 0;

        loop {
            let mut query: Vec<(&str, String)> = (start..start + FETCH_BATCH_SIZE)
                .map(|order| {
                    let id = document_id(filter.owner_id, &filter.video_id, order);
                    ("ids", id.to_string())
                })
                .collect();
            query.push(("namespace", self.namespace.clone()));

            let response: FetchResponse = self.get("/vectors/fetch", &query).await?;
            let found = response.vectors.len();
            total += found;

            if found < FETCH_BATCH_SIZE as usize {
                break;
            }
            start += FETCH_BATCH_SIZE;
        }

        debug!("Counted {} documents", total);
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}

// === Wire types ===

#[derive(Debug, Serialize)]
struct ChunkMetadata {
    user_id: i64,
    video_id: String,
    text: String,
    chunk_order: i32,
}

#[derive(Debug, Serialize)]
struct WireVector {
    id: String,
    values: Vec<f32>,
    metadata: ChunkMetadata,
}

impl From<&Document> for WireVector {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.to_string(),
            values: doc.embedding.clone(),
            metadata: ChunkMetadata {
                user_id: doc.owner_id,
                video_id: doc.video_id.clone(),
                text: doc.content.clone(),
                chunk_order: doc.chunk_order,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    values: Vec<f32>,
    metadata: Option<MatchMetadata>,
}

/// Pinecone stores metadata numbers as floats, so ids may come back as `1.0`.
#[derive(Debug, Deserialize)]
struct MatchMetadata {
    user_id: f64,
    video_id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    chunk_order: f64,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: std::collections::HashMap<String, Value>,
}
