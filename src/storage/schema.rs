//! Database schema definitions.
//!
//! Two domain tables (`plans`, `tasks`) plus the audit `events` table and
//! migration bookkeeping.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// The complete SQL schema for the growth plan database.
///
/// Timestamps are stored as INTEGER (Unix milliseconds). `plans.type` holds
/// the symbolic rank name. `plans.parent_id` deliberately has no foreign key:
/// deleting a parent leaves its children in place.
pub const SCHEMA_SQL: &str = r#"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Plans: five-rank goal tree (FIVE_YEAR > YEAR > QUARTER > MONTH > WEEK)
CREATE TABLE IF NOT EXISTS plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL,
    parent_id INTEGER,
    is_completed INTEGER NOT NULL DEFAULT 0,
    ai_coaching_tip TEXT,
    created_at INTEGER NOT NULL,
    CHECK (type IN ('FIVE_YEAR', 'YEAR', 'QUARTER', 'MONTH', 'WEEK'))
);

CREATE INDEX IF NOT EXISTS idx_plans_type_created ON plans(type, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_plans_parent ON plans(parent_id);

-- Tasks: flat daily missions
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    ai_feedback TEXT,
    date INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(date);

-- ====================
-- Audit
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at DESC);
"#;

/// Apply the schema and pending migrations.
///
/// Idempotent: safe to call on every open.
///
/// # Errors
///
/// Returns an error if a pragma, the DDL, or a migration fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    // Bring databases created by older versions up to date
    super::migrations::run_migrations(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

/// Check if a column exists in a table.
pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM pragma_table_info('{table}') WHERE name = ?1");
    conn.prepare(&sql)?.exists([column])
}
