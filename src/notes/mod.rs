//! Saved note storage
//!
//! Notes pair a transcript with optional recorded audio and metadata.
//! The [`NoteStore`] trait abstracts persistence so the orchestrator
//! and tests can run against an in-memory fake; the shipped
//! implementation is SQLite-backed.

pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteNoteStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::Language;

/// A saved note record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    /// Unique identifier (UUID).
    pub id: String,
    /// Display title, generated or user-provided.
    pub title: String,
    /// The accumulated transcript.
    pub transcript: String,
    /// Duration of the attached audio in seconds.
    pub duration_seconds: Option<f64>,
    /// Language active when the note was saved.
    pub language: Language,
    /// Topic labels, when a namer collaborator provided them.
    pub topics: Vec<String>,
    /// Short summary, when a namer collaborator provided one.
    pub summary: Option<String>,
    /// Whether an audio clip is stored with the note.
    pub has_audio: bool,
    /// When the note was created (ISO 8601).
    pub created_at: String,
    /// When the note was last modified (ISO 8601).
    pub updated_at: String,
}

impl NoteRecord {
    /// Creates a new record with a generated UUID and current
    /// timestamps.
    pub fn new(title: String, transcript: String, language: Language) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            transcript,
            duration_seconds: None,
            language,
            topics: Vec::new(),
            summary: None,
            has_audio: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Storage usage snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub used_bytes: u64,
    pub max_bytes: u64,
}

impl StorageInfo {
    pub fn percentage(&self) -> f64 {
        if self.max_bytes == 0 {
            return 100.0;
        }
        self.used_bytes as f64 / self.max_bytes as f64 * 100.0
    }

    /// Saving is refused once usage passes 90% of the cap, leaving
    /// headroom for updates to existing notes.
    pub fn can_store(&self) -> bool {
        self.used_bytes < self.max_bytes / 10 * 9
    }
}

/// Note persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum NoteStoreError {
    #[error("Failed to create storage directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Storage is full. Please delete some notes to save new ones.")]
    StorageFull,
}

/// Persistence seam for saved notes.
pub trait NoteStore {
    /// Persist a note, optionally with its audio bytes. Fails with
    /// [`NoteStoreError::StorageFull`] when the capacity check refuses
    /// the write.
    fn save(&self, note: &NoteRecord, audio: Option<&[u8]>) -> Result<(), NoteStoreError>;

    /// All notes, newest first, without audio payloads.
    fn list(&self) -> Result<Vec<NoteRecord>, NoteStoreError>;

    fn get(&self, id: &str) -> Result<Option<NoteRecord>, NoteStoreError>;

    /// The stored audio for a note, if any.
    fn get_audio(&self, id: &str) -> Result<Option<Vec<u8>>, NoteStoreError>;

    /// Update title and/or transcript; bumps `updated_at`. Returns the
    /// updated record, or `None` if the note does not exist.
    fn update(
        &self,
        id: &str,
        title: Option<&str>,
        transcript: Option<&str>,
    ) -> Result<Option<NoteRecord>, NoteStoreError>;

    /// Returns true if a note was deleted.
    fn delete(&self, id: &str) -> Result<bool, NoteStoreError>;

    fn count(&self) -> Result<i64, NoteStoreError>;

    fn storage_info(&self) -> Result<StorageInfo, NoteStoreError>;
}
