//! Initialize the growth plan database.
//!
//! Creates the database file (default `~/.growthplan/data/growth.db`, or the
//! test database when `GROWTH_TEST_DB=1`) and applies the schema.

use crate::config::{global_dir, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` when the database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine the growth plan directory".to_string())
    })?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    if existed {
        remove_database(&db_path)?;
    }

    // Opening applies the schema
    SqliteStorage::open(&db_path)?;

    // Keep the per-user directory out of version control
    if let Some(base_dir) = global_dir().filter(|dir| db_path.starts_with(dir)) {
        let gitignore_path = base_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, "# Local-only growth plan data\n*\n")?;
        }
    }

    if crate::is_silent() {
        println!("{}", db_path.display());
    } else if json {
        let output = InitOutput {
            database: db_path,
            recreated: existed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized growth plan database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: growth plan create \"Your 5-year vision\" --type five_year");
    }

    Ok(())
}

/// Delete the database file and its WAL sidecars.
fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = db_path.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            fs::remove_file(sidecar)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Plan, PlanType};
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database_with_schema() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("nested").join("growth.db");

        execute(Some(&db), false, true).unwrap();
        assert!(db.exists());

        let storage = SqliteStorage::open(&db).unwrap();
        assert!(storage.list_all_plans().unwrap().is_empty());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("growth.db");

        execute(Some(&db), false, true).unwrap();
        let result = execute(Some(&db), false, true);
        assert!(matches!(result, Err(Error::AlreadyInitialized { .. })));
    }

    #[test]
    fn test_init_force_starts_fresh() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("growth.db");
        execute(Some(&db), false, true).unwrap();

        {
            let mut storage = SqliteStorage::open(&db).unwrap();
            storage
                .create_plan(&Plan::new("Old vision", PlanType::FiveYear), "tester")
                .unwrap();
        }

        execute(Some(&db), true, true).unwrap();
        let storage = SqliteStorage::open(&db).unwrap();
        assert!(storage.list_all_plans().unwrap().is_empty());
    }
}
