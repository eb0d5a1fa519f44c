//! SQLite-backed note store.
//!
//! One store owns one database file; every call opens a fresh
//! connection, which keeps the store `Send` and free of connection
//! pooling concerns at this scale.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::migrations::run_migrations;
use super::{NoteRecord, NoteStore, NoteStoreError, StorageInfo};
use crate::i18n::Language;

/// Default storage cap. Inline audio blobs dominate usage.
pub const DEFAULT_MAX_STORAGE_BYTES: u64 = 512 * 1024 * 1024;

const DB_FILE_NAME: &str = "sesnot.db";

/// Column list for all SELECT queries (audio excluded; it is fetched
/// separately).
const SELECT_COLUMNS: &str = r#"
    id, title, transcript, duration_seconds, language,
    created_at, updated_at, audio IS NOT NULL, topics, summary
"#;

pub struct SqliteNoteStore {
    db_path: PathBuf,
    max_bytes: u64,
}

impl SqliteNoteStore {
    /// Open (creating if needed) the store under `dir` with the
    /// default storage cap.
    pub fn open(dir: &Path) -> Result<Self, NoteStoreError> {
        Self::open_with_capacity(dir, DEFAULT_MAX_STORAGE_BYTES)
    }

    /// Open the store with an explicit storage cap in bytes.
    pub fn open_with_capacity(dir: &Path, max_bytes: u64) -> Result<Self, NoteStoreError> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            tracing::info!("Created notes directory at {:?}", dir);
        }

        let store = Self {
            db_path: dir.join(DB_FILE_NAME),
            max_bytes,
        };

        let mut conn = store.connect()?;
        run_migrations(&mut conn)?;
        tracing::info!("Notes database ready at {:?}", store.db_path);
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, NoteStoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

/// Map a database row (in `SELECT_COLUMNS` order) to a record.
fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<NoteRecord> {
    let language: String = row.get(4)?;
    let topics_json: Option<String> = row.get(8)?;
    let topics = topics_json
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default();

    Ok(NoteRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        transcript: row.get(2)?,
        duration_seconds: row.get(3)?,
        language: Language::from_code(&language),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        has_audio: row.get::<_, i32>(7)? != 0,
        topics,
        summary: row.get(9)?,
    })
}

/// SQLITE_FULL and friends become the user-facing storage-full error.
fn map_write_error(e: rusqlite::Error) -> NoteStoreError {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        if err.code == rusqlite::ErrorCode::DiskFull {
            return NoteStoreError::StorageFull;
        }
    }
    NoteStoreError::Sqlite(e)
}

impl NoteStore for SqliteNoteStore {
    fn save(&self, note: &NoteRecord, audio: Option<&[u8]>) -> Result<(), NoteStoreError> {
        let info = self.storage_info()?;
        let incoming = audio.map(|a| a.len() as u64).unwrap_or(0);
        if !info.can_store() || info.used_bytes + incoming > self.max_bytes {
            tracing::warn!(
                used = info.used_bytes,
                incoming,
                max = self.max_bytes,
                "Refusing note save: storage cap reached"
            );
            return Err(NoteStoreError::StorageFull);
        }

        let topics_json = if note.topics.is_empty() {
            None
        } else {
            serde_json::to_string(&note.topics).ok()
        };

        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO notes (
                id, title, transcript, duration_seconds, language,
                created_at, updated_at, audio, topics, summary
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                note.id,
                note.title,
                note.transcript,
                note.duration_seconds,
                note.language.code(),
                note.created_at,
                note.updated_at,
                audio,
                topics_json,
                note.summary,
            ],
        )
        .map_err(map_write_error)?;

        tracing::debug!("Saved note: {} ({})", note.id, note.title);
        Ok(())
    }

    fn list(&self) -> Result<Vec<NoteRecord>, NoteStoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))?;

        let notes = stmt
            .query_map([], row_to_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn get(&self, id: &str) -> Result<Option<NoteRecord>, NoteStoreError> {
        let conn = self.connect()?;
        let note = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    fn get_audio(&self, id: &str) -> Result<Option<Vec<u8>>, NoteStoreError> {
        let conn = self.connect()?;
        let audio: Option<Option<Vec<u8>>> = conn
            .query_row(
                "SELECT audio FROM notes WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(audio.flatten())
    }

    fn update(
        &self,
        id: &str,
        title: Option<&str>,
        transcript: Option<&str>,
    ) -> Result<Option<NoteRecord>, NoteStoreError> {
        let conn = self.connect()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn
            .execute(
                r#"
                UPDATE notes
                SET title = COALESCE(?2, title),
                    transcript = COALESCE(?3, transcript),
                    updated_at = ?4
                WHERE id = ?1
                "#,
                params![id, title, transcript, now],
            )
            .map_err(map_write_error)?;

        if rows_affected == 0 {
            tracing::warn!("No note found with id: {}", id);
            return Ok(None);
        }

        tracing::debug!("Updated note: {}", id);
        self.get(id)
    }

    fn delete(&self, id: &str) -> Result<bool, NoteStoreError> {
        let conn = self.connect()?;
        let rows_affected = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;

        if rows_affected > 0 {
            tracing::debug!("Deleted note: {}", id);
        }
        Ok(rows_affected > 0)
    }

    fn count(&self) -> Result<i64, NoteStoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count)
    }

    fn storage_info(&self) -> Result<StorageInfo, NoteStoreError> {
        let used_bytes = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(StorageInfo {
            used_bytes,
            max_bytes: self.max_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (SqliteNoteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteNoteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_save_and_get() {
        let (store, _dir) = store();
        let note = NoteRecord::new(
            "Groceries".to_string(),
            "eggs milk bread".to_string(),
            Language::English,
        );
        store.save(&note, None).unwrap();

        let loaded = store.get(&note.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Groceries");
        assert_eq!(loaded.transcript, "eggs milk bread");
        assert!(!loaded.has_audio);
    }

    #[test]
    fn test_audio_round_trip() {
        let (store, _dir) = store();
        let mut note = NoteRecord::new("Memo".into(), "text".into(), Language::Turkish);
        note.duration_seconds = Some(2.5);
        store.save(&note, Some(&[1u8, 2, 3, 4])).unwrap();

        let loaded = store.get(&note.id).unwrap().unwrap();
        assert!(loaded.has_audio);
        assert_eq!(loaded.language, Language::Turkish);
        assert_eq!(loaded.duration_seconds, Some(2.5));

        let audio = store.get_audio(&note.id).unwrap().unwrap();
        assert_eq!(audio, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_get_audio_for_audioless_note() {
        let (store, _dir) = store();
        let note = NoteRecord::new("T".into(), "x".into(), Language::English);
        store.save(&note, None).unwrap();
        assert!(store.get_audio(&note.id).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let (store, _dir) = store();
        let mut first = NoteRecord::new("First".into(), "a".into(), Language::English);
        first.created_at = "2025-01-01T00:00:00Z".to_string();
        let mut second = NoteRecord::new("Second".into(), "b".into(), Language::English);
        second.created_at = "2025-06-01T00:00:00Z".to_string();

        store.save(&first, None).unwrap();
        store.save(&second, None).unwrap();

        let notes = store.list().unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "Second");
        assert_eq!(notes[1].title, "First");
    }

    #[test]
    fn test_update_title_only() {
        let (store, _dir) = store();
        let note = NoteRecord::new("Old".into(), "body".into(), Language::English);
        store.save(&note, None).unwrap();

        let updated = store
            .update(&note.id, Some("New title"), None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.transcript, "body");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn test_update_missing_note() {
        let (store, _dir) = store();
        assert!(store.update("no-such-id", Some("x"), None).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let (store, _dir) = store();
        let note = NoteRecord::new("T".into(), "x".into(), Language::English);
        store.save(&note, None).unwrap();

        assert!(store.delete(&note.id).unwrap());
        assert!(!store.delete(&note.id).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_storage_cap_refuses_save() {
        let dir = tempfile::tempdir().unwrap();
        // Cap below the size of an empty database file
        let store = SqliteNoteStore::open_with_capacity(dir.path(), 1024).unwrap();
        let note = NoteRecord::new("T".into(), "x".into(), Language::English);

        let err = store.save(&note, Some(&[0u8; 4096])).unwrap_err();
        assert!(matches!(err, NoteStoreError::StorageFull));
    }

    #[test]
    fn test_topics_round_trip() {
        let (store, _dir) = store();
        let mut note = NoteRecord::new("T".into(), "x".into(), Language::English);
        note.topics = vec!["work".to_string(), "planning".to_string()];
        note.summary = Some("A plan".to_string());
        store.save(&note, None).unwrap();

        let loaded = store.get(&note.id).unwrap().unwrap();
        assert_eq!(loaded.topics, vec!["work", "planning"]);
        assert_eq!(loaded.summary.as_deref(), Some("A plan"));
    }
}
