//! Migration runner for the notes database.
//!
//! Migrations are versioned and tracked in the `migrations` table.
//! Each migration is run exactly once, in order.

use rusqlite::Connection;

use super::schema::{
    ALTER_ADD_SUMMARY, ALTER_ADD_TOPICS, CREATE_MIGRATIONS_TABLE, CREATE_NOTES_CREATED_AT_INDEX,
    CREATE_NOTES_TABLE,
};
use super::NoteStoreError;

/// A database migration with a version number, name, and SQL statements.
struct Migration {
    version: i32,
    name: &'static str,
    statements: &'static [&'static str],
}

/// All migrations to be applied, in order.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_notes_table",
        statements: &[CREATE_NOTES_TABLE, CREATE_NOTES_CREATED_AT_INDEX],
    },
    Migration {
        version: 2,
        name: "add_note_labels",
        statements: &[ALTER_ADD_TOPICS, ALTER_ADD_SUMMARY],
    },
];

/// Returns the current schema version from the database.
fn get_current_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending migrations, each in its own transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<(), NoteStoreError> {
    conn.execute_batch(CREATE_MIGRATIONS_TABLE)?;

    let current_version = get_current_version(conn);
    tracing::debug!("Notes database schema version: {}", current_version);

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    tracing::info!("{} pending notes migration(s) to apply", pending.len());

    for migration in pending {
        let tx = conn.transaction()?;

        for statement in migration.statements {
            tx.execute_batch(statement).map_err(|e| {
                NoteStoreError::Migration(format!("Migration {} failed: {}", migration.name, e))
            })?;
        }

        tx.execute(
            "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
            (migration.version, migration.name),
        )?;
        tx.commit()?;

        tracing::info!(
            "Applied notes migration {} (v{})",
            migration.name,
            migration.version
        );
    }

    Ok(())
}
