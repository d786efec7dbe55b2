//! Configuration management.
//!
//! This module provides functions for locating the growth plan directory,
//! resolving the database path, and picking the actor recorded in the
//! audit trail.
//!
//! # Layout
//!
//! Everything lives under `~/.growthplan/`:
//! - **Database**: `data/growth.db` (or `test/growth.db` in test mode)
//! - **Settings**: `config.json` (coach credentials and model)

use std::path::{Path, PathBuf};

/// Name of the per-user directory under `$HOME`.
const DIR_NAME: &str = ".growthplan";

/// Database file name.
const DB_FILE: &str = "growth.db";

/// Get the global growth plan directory location (`~/.growthplan/`).
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(DIR_NAME))
}

/// Path of the JSON settings file (`~/.growthplan/config.json`).
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("config.json"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `GROWTH_TEST_DB=1` (or any non-empty value
/// other than `0`/`false`). This redirects all database operations to an
/// isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("GROWTH_TEST_DB")
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test database path (`~/.growthplan/test/growth.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("test").join(DB_FILE))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided (`--db` or `GROWTH_DB`), use it directly
/// 2. `GROWTH_TEST_DB` environment variable → uses test database
/// 3. Global location: `~/.growthplan/data/growth.db`
///
/// Returns `None` only when no home directory can be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    global_dir().map(|dir| dir.join("data").join(DB_FILE))
}

/// Get the default actor name.
///
/// Priority:
/// 1. `GROWTH_ACTOR` environment variable
/// 2. System username
/// 3. "user"
#[must_use]
pub fn default_actor() -> String {
    ["GROWTH_ACTOR", "USER"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "user".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_actor() {
        let actor = default_actor();
        assert!(!actor.is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/growth.db");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_defaults_to_growth_db() {
        let path = resolve_db_path(None).unwrap();
        assert!(path.ends_with(DB_FILE));
        assert!(path.to_string_lossy().contains(DIR_NAME));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.to_string_lossy().contains("/test/"));
        assert!(test.ends_with(DB_FILE));
        assert_ne!(global.join("data").join(DB_FILE), test);
    }

    #[test]
    fn test_is_truthy() {
        for falsy in ["", "0", "false", "FALSE"] {
            assert!(!is_truthy(falsy), "{falsy:?}");
        }
        for truthy in ["1", "true", "yes"] {
            assert!(is_truthy(truthy), "{truthy:?}");
        }
    }

    #[test]
    fn test_config_file_lives_in_global_dir() {
        let config = config_file_path().unwrap();
        assert!(config.starts_with(global_dir().unwrap()));
        assert!(config.ends_with("config.json"));
    }
}
