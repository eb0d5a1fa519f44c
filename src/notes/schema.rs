//! SQL schema statements for the notes database.

/// Tracks applied migrations.
pub const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Saved notes. Audio is stored inline as a BLOB; notes without audio
/// leave it NULL.
pub const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    transcript TEXT NOT NULL,
    duration_seconds REAL,
    language TEXT NOT NULL DEFAULT 'en',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    audio BLOB
);
"#;

pub const CREATE_NOTES_CREATED_AT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at DESC);
"#;

/// v2: labels produced by the note-naming collaborator.
pub const ALTER_ADD_TOPICS: &str = r#"
ALTER TABLE notes ADD COLUMN topics TEXT;
"#;

pub const ALTER_ADD_SUMMARY: &str = r#"
ALTER TABLE notes ADD COLUMN summary TEXT;
"#;
