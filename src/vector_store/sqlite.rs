//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity. Searches
//! only ever scan the rows of one (owner, video) pair, which keeps the brute-force
//! approach cheap for transcript-sized collections.

use super::{cosine_similarity, rank, ChunkFilter, Document, SearchResult, VectorStore};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        owner_id INTEGER NOT NULL,
        video_id TEXT NOT NULL,
        content TEXT NOT NULL,
        chunk_order INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_owner_video ON chunks(owner_id, video_id);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubechatError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at_str: String = row.get(6)?;

        Ok(Document {
            id: Uuid::parse_str(&id_str).unwrap_or_default(),
            owner_id: row.get(1)?,
            video_id: row.get(2)?,
            content: row.get(3)?,
            chunk_order: row.get(4)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, owner_id, video_id, content, chunk_order, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    doc.id.to_string(),
                    doc.owner_id,
                    doc.video_id,
                    doc.content,
                    doc.chunk_order,
                    Self::embedding_to_bytes(&doc.embedding),
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
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
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_id, video_id, content, chunk_order, embedding, indexed_at
            FROM chunks
            WHERE owner_id = ?1 AND video_id = ?2
            "#,
        )?;

        let docs = stmt.query_map(params![filter.owner_id, filter.video_id], |row| {
            Self::row_to_document(row)
        })?;

        let results: Vec<SearchResult> = docs
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(|doc| SearchResult {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc,
            })
            .collect();

        let results = rank(results, limit);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete(&self, ids: &[Uuid]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut deleted = 0;
        for id in ids {
            deleted += tx.execute("DELETE FROM chunks WHERE id = ?1", params![id.to_string()])?;
        }

        tx.commit()?;
        info!("Deleted {} documents", deleted);
        Ok(deleted)
    }

    async fn count(&self, filter: &ChunkFilter) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE owner_id = ?1 AND video_id = ?2",
            params![filter.owner_id, filter.video_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::doc;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let first = doc(1, "video1", 0, vec![1.0, 0.0, 0.0]);
        let second = doc(1, "video1", 1, vec![0.6, 0.8, 0.0]);
        store.upsert_batch(&[first.clone(), second]).await.unwrap();

        let filter = ChunkFilter::new(1, "video1");
        assert_eq!(store.count(&filter).await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.id, first.id);
        assert_eq!(results[0].document.embedding, vec![1.0, 0.0, 0.0]);

        let deleted = store.delete(&[first.id]).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reupsert_does_not_duplicate() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let batch = vec![doc(3, "vid", 0, vec![1.0]), doc(3, "vid", 1, vec![0.5])];

        store.upsert_batch(&batch).await.unwrap();
        store.upsert_batch(&batch).await.unwrap();

        assert_eq!(store.count(&ChunkFilter::new(3, "vid")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_never_crosses_tenants() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[
                doc(1, "alpha", 0, vec![1.0, 0.0]),
                doc(2, "beta", 0, vec![1.0, 0.0]),
                doc(2, "alpha", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store
            .search(&[1.0, 0.0], &ChunkFilter::new(1, "alpha"), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.owner_id, 1);

        let results = store
            .search(&[1.0, 0.0], &ChunkFilter::new(1, "beta"), 10)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store.upsert_batch(&[doc(1, "vid", 0, vec![1.0])]).await.unwrap();
        }

        let store = SqliteVectorStore::new(&path).unwrap();
        assert_eq!(store.count(&ChunkFilter::new(1, "vid")).await.unwrap(), 1);
    }
}
