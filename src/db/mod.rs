//! Relational store for users, videos and chat messages.
//!
//! A single SQLite connection behind a mutex. Calls are short and synchronous,
//! so the guard is never held across an `.await`.

mod models;
mod password;

pub use models::{ChatMessage, NewUser, Role, User, Video, MIN_PASSWORD_LEN};
pub use password::{hash_password, verify_password};

use crate::error::{Result, TubechatError};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS videos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        url TEXT NOT NULL,
        video_id TEXT NOT NULL,
        transcript TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (user_id, video_id)
    );

    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        video_id TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_messages_thread
        ON chat_messages(user_id, video_id, created_at);
"#;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";
const VIDEO_COLUMNS: &str = "id, user_id, url, video_id, transcript, created_at";
const MESSAGE_COLUMNS: &str = "id, user_id, video_id, role, content, created_at";

/// Handle to the relational store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path` and apply the schema.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::init(conn)?;

        info!("Opened database at {:?}", path);
        Ok(db)
    }

    /// Open a private in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubechatError::Config(format!("Database lock poisoned: {}", e)))
    }

    // === Users ===

    /// Insert a user with an already hashed password.
    #[instrument(skip(self, password_hash))]
    pub fn insert_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let conn = self.lock()?;
        let created_at = now();

        conn.execute(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, email, password_hash, timestamp(&created_at)],
        )
        .map_err(|e| {
            if unique_violation(&e) {
                TubechatError::AlreadyExists(format!("A user with email {} already exists", email))
            } else {
                e.into()
            }
        })?;

        let id = conn.last_insert_rowid();
        debug!(user_id = id, "Inserted user");

        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    // === Videos ===

    /// Persist an ingested video.
    ///
    /// Fails with `AlreadyExists` if the owner already has this video.
    #[instrument(skip(self, url, transcript), fields(transcript_len = transcript.len()))]
    pub fn insert_video(
        &self,
        user_id: i64,
        url: &str,
        video_id: &str,
        transcript: &str,
    ) -> Result<Video> {
        let conn = self.lock()?;
        let created_at = now();

        conn.execute(
            r#"
            INSERT INTO videos (user_id, url, video_id, transcript, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![user_id, url, video_id, transcript, timestamp(&created_at)],
        )
        .map_err(|e| {
            if unique_violation(&e) {
                TubechatError::AlreadyExists(format!(
                    "Video {} already exists for user {}",
                    video_id, user_id
                ))
            } else if foreign_key_violation(&e) {
                TubechatError::UserNotFound(user_id)
            } else {
                e.into()
            }
        })?;

        Ok(Video {
            id: conn.last_insert_rowid(),
            user_id,
            url: url.to_string(),
            video_id: video_id.to_string(),
            transcript: transcript.to_string(),
            created_at,
        })
    }

    pub fn find_video(&self, user_id: i64, video_id: &str) -> Result<Option<Video>> {
        let conn = self.lock()?;
        let video = conn
            .query_row(
                &format!(
                    "SELECT {} FROM videos WHERE user_id = ?1 AND video_id = ?2",
                    VIDEO_COLUMNS
                ),
                params![user_id, video_id],
                video_from_row,
            )
            .optional()?;
        Ok(video)
    }

    /// All videos of an owner, in insertion order.
    pub fn list_videos(&self, user_id: i64) -> Result<Vec<Video>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM videos WHERE user_id = ?1 ORDER BY id",
            VIDEO_COLUMNS
        ))?;
        let videos = stmt
            .query_map(params![user_id], video_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(videos)
    }

    // === Chat messages ===

    pub fn insert_message(
        &self,
        user_id: i64,
        video_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ChatMessage> {
        let conn = self.lock()?;
        let created_at = now();

        conn.execute(
            r#"
            INSERT INTO chat_messages (user_id, video_id, role, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![user_id, video_id, role.as_str(), content, timestamp(&created_at)],
        )
        .map_err(|e| {
            if foreign_key_violation(&e) {
                TubechatError::UserNotFound(user_id)
            } else {
                e.into()
            }
        })?;

        Ok(ChatMessage {
            id: conn.last_insert_rowid(),
            user_id,
            video_id: video_id.to_string(),
            role,
            content: content.to_string(),
            created_at,
        })
    }

    /// Remove a message. Returns whether a row was deleted.
    pub fn delete_message(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM chat_messages WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Conversation about one video, oldest first.
    pub fn history(&self, user_id: i64, video_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM chat_messages
            WHERE user_id = ?1 AND video_id = ?2
            ORDER BY created_at ASC, id ASC
            "#,
            MESSAGE_COLUMNS
        ))?;
        let messages = stmt
            .query_map(params![user_id, video_id], message_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC timestamps so text order equals time order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
    })
}

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(0)?,
        user_id: row.get(1)?,
        url: row.get(2)?,
        video_id: row.get(3)?,
        transcript: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let role: String = row.get(3)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(ChatMessage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        video_id: row.get(2)?,
        role,
        content: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}

fn unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user() -> (Database, User) {
        let db = Database::in_memory().unwrap();
        let user = db.insert_user("Ada", "ada@example.com", "hash").unwrap();
        (db, user)
    }

    #[test]
    fn test_users_round_trip() {
        let (db, user) = db_with_user();

        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.email, "ada@example.com");
        assert_eq!(fetched.password_hash, "hash");

        assert!(db.get_user(user.id + 100).unwrap().is_none());
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_email_is_already_exists() {
        let (db, _) = db_with_user();
        let err = db.insert_user("Other", "ada@example.com", "hash").unwrap_err();
        assert_eq!(err.kind(), "already_exists");
    }

    #[test]
    fn test_video_unique_per_owner() {
        let (db, user) = db_with_user();
        let other = db.insert_user("Bob", "bob@example.com", "hash").unwrap();

        db.insert_video(user.id, "https://youtu.be/abc123XYZ_9", "abc123XYZ_9", "text")
            .unwrap();
        let err = db
            .insert_video(user.id, "https://youtu.be/abc123XYZ_9", "abc123XYZ_9", "text")
            .unwrap_err();
        assert_eq!(err.kind(), "already_exists");

        // Same video for a different owner is fine
        db.insert_video(other.id, "https://youtu.be/abc123XYZ_9", "abc123XYZ_9", "text")
            .unwrap();

        assert_eq!(db.list_videos(user.id).unwrap().len(), 1);
        assert!(db.find_video(other.id, "abc123XYZ_9").unwrap().is_some());
        assert!(db.find_video(other.id, "zzzzzzzzzzz").unwrap().is_none());
    }

    #[test]
    fn test_video_requires_existing_user() {
        let db = Database::in_memory().unwrap();
        let err = db.insert_video(42, "u", "abc123XYZ_9", "t").unwrap_err();
        assert_eq!(err.kind(), "user_not_found");
    }

    #[test]
    fn test_videos_listed_in_insertion_order() {
        let (db, user) = db_with_user();
        for id in ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"] {
            db.insert_video(user.id, id, id, "t").unwrap();
        }

        let ids: Vec<String> = db
            .list_videos(user.id)
            .unwrap()
            .into_iter()
            .map(|v| v.video_id)
            .collect();
        assert_eq!(ids, vec!["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]);
    }

    #[test]
    fn test_history_ordering_and_delete() {
        let (db, user) = db_with_user();

        let question = db.insert_message(user.id, "vid", Role::User, "q1").unwrap();
        db.insert_message(user.id, "vid", Role::Assistant, "a1").unwrap();
        db.insert_message(user.id, "other", Role::User, "elsewhere").unwrap();

        let history = db.history(user.id, "vid").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert!(history[0].created_at <= history[1].created_at);

        assert!(db.delete_message(question.id).unwrap());
        assert!(!db.delete_message(question.id).unwrap());
        assert_eq!(db.history(user.id, "vid").unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("tubechat.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert_user("Ada", "ada@example.com", "hash").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}
