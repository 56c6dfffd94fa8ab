//! SQLite-based storage for tasks, habits, the habit log and badges.
//!
//! Every query is scoped to an owner. Timestamps are stored as RFC 3339 text
//! and calendar dates as `YYYY-MM-DD`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result};
use crate::gamification::{Badge, BadgeMetadata, BadgeType};
use crate::habit::{Habit, HabitFrequency, HabitLog};
use crate::task::{Task, TaskPriority, TaskStatus};

const TASK_COLUMNS: &str = "id, owner_id, title, description, priority, status, due_date, \
                            completed_at, created_at, updated_at, tags";
const HABIT_COLUMNS: &str = "id, owner_id, title, description, frequency, current_streak, \
                             longest_streak, last_completed_date, archived, created_at";
const LOG_COLUMNS: &str = "id, habit_id, owner_id, completed_at, notes";
const BADGE_COLUMNS: &str = "id, owner_id, badge_type, earned_at, metadata";

/// SQLite database for questlog records.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// File backing this database; `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Open the database at `<data dir>/questlog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("questlog.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn, path })
    }

    // =========================================================================
    // tasks
    // =========================================================================

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
            params![
                task.id,
                task.owner_id,
                task.title,
                task.description,
                task.priority.as_str(),
                task.status.as_str(),
                task.due_date.map(|d| d.to_rfc3339()),
                task.completed_at.map(|d| d.to_rfc3339()),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
                serde_json::to_string(&task.tags)?,
            ],
        )?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` when no task with this id belongs to the owner.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?3, description = ?4, priority = ?5, status = ?6, due_date = ?7,
                 completed_at = ?8, updated_at = ?9, tags = ?10
             WHERE id = ?1 AND owner_id = ?2",
            params![
                task.id,
                task.owner_id,
                task.title,
                task.description,
                task.priority.as_str(),
                task.status.as_str(),
                task.due_date.map(|d| d.to_rfc3339()),
                task.completed_at.map(|d| d.to_rfc3339()),
                task.updated_at.to_rfc3339(),
                serde_json::to_string(&task.tags)?,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("task", &task.id));
        }
        Ok(())
    }

    pub fn get_task(&self, owner_id: &str, id: &str) -> Result<Task> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ?1 AND id = ?2"),
                params![owner_id, id],
                task_from_row,
            )
            .optional()
            .map_err(|e| decode_error("tasks", e))?
            .ok_or_else(|| CoreError::not_found("task", id))
    }

    /// All of the owner's tasks, oldest first.
    pub fn list_tasks(&self, owner_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ?1 ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![owner_id], task_from_row)?;
        collect_rows("tasks", rows)
    }

    // =========================================================================
    // habits
    // =========================================================================

    pub fn insert_habit(&self, habit: &Habit) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO habits ({HABIT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                habit.id,
                habit.owner_id,
                habit.title,
                habit.description,
                habit.frequency.to_string(),
                habit.current_streak,
                habit.longest_streak,
                habit.last_completed_date.map(|d| d.to_string()),
                habit.archived,
                habit.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` when no habit with this id belongs to the owner.
    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        update_habit_on(&self.conn, habit)
    }

    pub fn get_habit(&self, owner_id: &str, id: &str) -> Result<Habit> {
        self.conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE owner_id = ?1 AND id = ?2"),
                params![owner_id, id],
                habit_from_row,
            )
            .optional()
            .map_err(|e| decode_error("habits", e))?
            .ok_or_else(|| CoreError::not_found("habit", id))
    }

    pub fn list_habits(&self, owner_id: &str, include_archived: bool) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits
             WHERE owner_id = ?1 AND (?2 OR archived = 0)
             ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![owner_id, include_archived], habit_from_row)?;
        collect_rows("habits", rows)
    }

    pub fn count_habits(&self, owner_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // =========================================================================
    // habit log
    // =========================================================================

    pub fn append_habit_log(&self, log: &HabitLog) -> Result<()> {
        insert_log_on(&self.conn, log)
    }

    /// Append `log` and store the habit's new streak fields in one transaction.
    pub fn record_habit_completion(&self, habit: &Habit, log: &HabitLog) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_log_on(&tx, log)?;
        update_habit_on(&tx, habit)?;
        tx.commit()?;
        Ok(())
    }

    /// Log entries for one habit, oldest first.
    pub fn habit_logs(&self, owner_id: &str, habit_id: &str) -> Result<Vec<HabitLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM habit_logs
             WHERE owner_id = ?1 AND habit_id = ?2
             ORDER BY completed_at, id"
        ))?;
        let rows = stmt.query_map(params![owner_id, habit_id], log_from_row)?;
        collect_rows("habit_logs", rows)
    }

    // =========================================================================
    // badges
    // =========================================================================

    /// Insert unless an equivalent badge is already stored.
    ///
    /// Returns whether a row was written.
    pub fn insert_badge(&self, badge: &Badge) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO badges (id, owner_id, badge_type, task_key, earned_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                badge.id,
                badge.owner_id,
                badge.badge_type.as_str(),
                badge.task_key(),
                badge.earned_at.to_rfc3339(),
                serde_json::to_string(&badge.metadata)?,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Owner's badges in the order they were earned.
    pub fn list_badges(&self, owner_id: &str) -> Result<Vec<Badge>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE owner_id = ?1 ORDER BY earned_at, rowid"
        ))?;
        let rows = stmt.query_map(params![owner_id], badge_from_row)?;
        collect_rows("badges", rows)
    }
}

fn update_habit_on(conn: &Connection, habit: &Habit) -> Result<()> {
    let changed = conn.execute(
        "UPDATE habits
         SET title = ?3, description = ?4, frequency = ?5, current_streak = ?6,
             longest_streak = ?7, last_completed_date = ?8, archived = ?9
         WHERE id = ?1 AND owner_id = ?2",
        params![
            habit.id,
            habit.owner_id,
            habit.title,
            habit.description,
            habit.frequency.to_string(),
            habit.current_streak,
            habit.longest_streak,
            habit.last_completed_date.map(|d| d.to_string()),
            habit.archived,
        ],
    )?;
    if changed == 0 {
        return Err(CoreError::not_found("habit", &habit.id));
    }
    Ok(())
}

fn insert_log_on(conn: &Connection, log: &HabitLog) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO habit_logs ({LOG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            log.id,
            log.habit_id,
            log.owner_id,
            log.completed_at.to_rfc3339(),
            log.notes,
        ],
    )?;
    Ok(())
}

/// Decoder failures become `CorruptRow`; anything else stays a query error.
fn decode_error(table: &'static str, err: rusqlite::Error) -> CoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(idx, _, source) => DatabaseError::CorruptRow {
            table,
            message: format!("column {idx}: {source}"),
        }
        .into(),
        rusqlite::Error::InvalidColumnType(idx, name, ty) => DatabaseError::CorruptRow {
            table,
            message: format!("column {idx} ({name}) has unexpected type {ty}"),
        }
        .into(),
        other => other.into(),
    }
}

fn collect_rows<T>(
    table: &'static str,
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    rows.map(|row| row.map_err(|e| decode_error(table, e)))
        .collect()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;
    let tags: String = row.get(10)?;
    Ok(Task {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: priority
            .parse::<TaskPriority>()
            .map_err(|e| conversion_error(4, e))?,
        status: status
            .parse::<TaskStatus>()
            .map_err(|e| conversion_error(5, e))?,
        due_date: optional_timestamp(row, 6)?,
        completed_at: optional_timestamp(row, 7)?,
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
        tags: serde_json::from_str(&tags).map_err(|e| conversion_error(10, e))?,
    })
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let frequency: String = row.get(4)?;
    let last_completed: Option<String> = row.get(7)?;
    Ok(Habit {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        frequency: HabitFrequency::parse(&frequency).map_err(|e| conversion_error(4, e))?,
        current_streak: row.get(5)?,
        longest_streak: row.get(6)?,
        last_completed_date: last_completed
            .map(|s| s.parse::<NaiveDate>().map_err(|e| conversion_error(7, e)))
            .transpose()?,
        archived: row.get(8)?,
        created_at: timestamp(row, 9)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<HabitLog> {
    Ok(HabitLog {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        owner_id: row.get(2)?,
        completed_at: timestamp(row, 3)?,
        notes: row.get(4)?,
    })
}

fn badge_from_row(row: &Row<'_>) -> rusqlite::Result<Badge> {
    let badge_type: String = row.get(2)?;
    let metadata: String = row.get(4)?;
    Ok(Badge {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        badge_type: badge_type
            .parse::<BadgeType>()
            .map_err(|e| conversion_error(2, e))?,
        earned_at: timestamp(row, 3)?,
        metadata: serde_json::from_str::<BadgeMetadata>(&metadata)
            .map_err(|e| conversion_error(4, e))?,
    })
}
