//! Database schema migrations for questlog.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: tasks, habits and the append-only habit log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id           TEXT PRIMARY KEY,
            owner_id     TEXT NOT NULL,
            title        TEXT NOT NULL,
            description  TEXT,
            priority     TEXT NOT NULL,
            status       TEXT NOT NULL,
            due_date     TEXT,
            completed_at TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL,
            tags         TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS habits (
            id                  TEXT PRIMARY KEY,
            owner_id            TEXT NOT NULL,
            title               TEXT NOT NULL,
            description         TEXT,
            frequency           TEXT NOT NULL,
            current_streak      INTEGER NOT NULL DEFAULT 0,
            longest_streak      INTEGER NOT NULL DEFAULT 0,
            last_completed_date TEXT,
            archived            INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_logs (
            id           TEXT PRIMARY KEY,
            habit_id     TEXT NOT NULL REFERENCES habits(id),
            owner_id     TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            notes        TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_owner_status ON tasks(owner_id, status);
        CREATE INDEX IF NOT EXISTS idx_habits_owner ON habits(owner_id);
        CREATE INDEX IF NOT EXISTS idx_habit_logs_habit ON habit_logs(habit_id, completed_at);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: badges.
///
/// Two partial unique indexes carry the uniqueness rule: one row per
/// `(owner, badge_type)` for one-time badges, and one `task_completed` row
/// per `(owner, task)`.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS badges (
            id         TEXT PRIMARY KEY,
            owner_id   TEXT NOT NULL,
            badge_type TEXT NOT NULL,
            task_key   TEXT,
            earned_at  TEXT NOT NULL,
            metadata   TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_badges_one_time
            ON badges(owner_id, badge_type) WHERE badge_type <> 'task_completed';
        CREATE UNIQUE INDEX IF NOT EXISTS idx_badges_per_task
            ON badges(owner_id, task_key) WHERE badge_type = 'task_completed';
        CREATE INDEX IF NOT EXISTS idx_badges_owner_earned ON badges(owner_id, earned_at);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn v1_database_upgrades_to_badges() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);

        migrate(&conn).unwrap();
        let badges: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'badges'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(badges, 1);
    }
}
