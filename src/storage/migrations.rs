//! Versioned upgrades for databases created by older releases.
//!
//! The SQL lives in `migrations/` at the crate root and is compiled in with
//! `include_str!`.

use rusqlite::{Connection, Result};
use tracing::{info, warn};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// Applied in order. Each version is its file stem.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_add_plan_coaching_tip",
        sql: include_str!("../../migrations/001_add_plan_coaching_tip.sql"),
    },
    Migration {
        version: "002_add_task_feedback",
        sql: include_str!("../../migrations/002_add_task_feedback.sql"),
    },
    Migration {
        version: "003_add_lookup_indexes",
        sql: include_str!("../../migrations/003_add_lookup_indexes.sql"),
    },
];

/// Apply every migration not yet listed in `schema_migrations`.
///
/// Already-applied migrations (tracked in `schema_migrations`) are skipped,
/// so this is safe to call on every open.
///
/// # Errors
///
/// Returns an error if a migration fails to apply. `ALTER TABLE` failures for
/// duplicate columns are logged and the migration is marked complete, since a
/// fresh database already has those columns from the base DDL.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        if let Err(e) = conn.execute_batch(migration.sql) {
            if e.to_string().contains("duplicate column name") {
                warn!(
                    version = migration.version,
                    "Migration partially applied (columns exist), marking complete"
                );
            } else {
                return Err(e);
            }
        }

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{SCHEMA_SQL, apply_schema, column_exists};

    /// Tables as the first schema version created them (no AI note columns).
    const V1_SCHEMA: &str = "
        CREATE TABLE plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL,
            parent_id INTEGER,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            date INTEGER NOT NULL
        );
        INSERT INTO plans (title, type, created_at) VALUES ('Old vision', 'FIVE_YEAR', 1);
    ";

    fn count_applied(conn: &Connection) -> i32 {
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).expect("Base schema should apply");
        run_migrations(&conn).expect("Migrations should apply to fresh database");

        assert_eq!(count_applied(&conn), 3);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed (idempotent)");

        assert_eq!(count_applied(&conn), 3);
    }

    #[test]
    fn test_upgrade_from_first_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(V1_SCHEMA).unwrap();
        assert!(!column_exists(&conn, "plans", "ai_coaching_tip").unwrap());

        apply_schema(&conn).expect("Upgrade should succeed");

        assert!(column_exists(&conn, "plans", "ai_coaching_tip").unwrap());
        assert!(column_exists(&conn, "tasks", "ai_feedback").unwrap());

        let title: String = conn
            .query_row("SELECT title FROM plans WHERE type = 'FIVE_YEAR'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(title, "Old vision");
    }
}
