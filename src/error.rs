//! Error types for the growth plan tracker.
//!
//! Every failure maps to a stable `ErrorCode`. The code fixes the process
//! exit status (2 storage, 3 missing row, 4 bad input, 7 config, 8 I/O,
//! 9 coach) and whether retrying with different input can help. When JSON
//! output is active, `main` prints `to_structured_json` to stderr.

use crate::model::PlanType;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for growth plan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable codes reported to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    PlanNotFound,
    TaskNotFound,
    ParentNotFound,

    // Validation (exit 4)
    RequiredField,
    InvalidParent,
    MissingParent,
    InvalidArgument,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Coach (exit 9)
    CoachError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Code string, e.g. `PLAN_NOT_FOUND`.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::ParentNotFound => "PARENT_NOT_FOUND",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::InvalidParent => "INVALID_PARENT",
            Self::MissingParent => "MISSING_PARENT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::CoachError => "COACH_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::PlanNotFound | Self::TaskNotFound | Self::ParentNotFound => 3,
            Self::RequiredField
            | Self::InvalidParent
            | Self::MissingParent
            | Self::InvalidArgument => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::CoachError => 9,
        }
    }

    /// Whether a caller should retry with corrected input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequiredField
                | Self::InvalidParent
                | Self::MissingParent
                | Self::InvalidArgument
                | Self::DatabaseError
        )
    }
}

/// Errors that can occur in growth plan operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `growth init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Plan not found: {id}")]
    PlanNotFound { id: i64 },

    #[error("Task not found: {id}")]
    TaskNotFound { id: i64 },

    #[error("Parent plan not found: {id}")]
    ParentNotFound { id: i64 },

    #[error("Required field is blank: {0}")]
    RequiredField(&'static str),

    #[error("A {child} plan cannot sit under a {parent} plan")]
    InvalidParent { child: PlanType, parent: PlanType },

    #[error("A {plan_type} plan needs a parent")]
    MissingParent { plan_type: PlanType },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Coach error: {0}")]
    Coach(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The stable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::PlanNotFound { .. } => ErrorCode::PlanNotFound,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::ParentNotFound { .. } => ErrorCode::ParentNotFound,
            Self::RequiredField(_) => ErrorCode::RequiredField,
            Self::InvalidParent { .. } => ErrorCode::InvalidParent,
            Self::MissingParent { .. } => ErrorCode::MissingParent,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Coach(_) => ErrorCode::CoachError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// `None` when there is nothing useful to suggest.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `growth init` to create the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::PlanNotFound { id } => Some(format!(
                "No plan with ID {id}. Use `growth plan list` to see available plans."
            )),

            Self::TaskNotFound { id } => Some(format!(
                "No task with ID {id}. Use `growth task list --all` to see available tasks."
            )),

            Self::ParentNotFound { id } => Some(format!(
                "Plan {id} does not exist (it may have been deleted). \
                 Use `growth plan tree` to pick a parent."
            )),

            Self::MissingParent { plan_type } => plan_type.parent_type().map(|parent| {
                format!(
                    "Pass --parent <id> of a {} plan. Use `growth plan list --type {}` to find one.",
                    parent.as_str(),
                    parent.as_str()
                )
            }),

            Self::InvalidParent { child, .. } => Some(match child.parent_type() {
                Some(parent) => format!("A {child} plan must be a child of a {parent} plan."),
                None => format!("{child} plans are roots and take no parent."),
            }),

            Self::InvalidArgument(msg) if msg.contains("plan type") => Some(
                "Valid types: FIVE_YEAR, YEAR, QUARTER, MONTH, WEEK. \
                 Synonyms: vision→FIVE_YEAR, annual→YEAR, q→QUARTER"
                    .to_string(),
            ),

            Self::Config(msg) if msg.contains("API key") => Some(
                "Set GROWTH_COACH_API_KEY or add coach.api_key to ~/.growthplan/config.json"
                    .to_string(),
            ),

            Self::RequiredField(_)
            | Self::InvalidArgument(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Coach(_)
            | Self::Other(_) => None,
        }
    }

    /// `{"error": {code, message, retryable, exit_code, hint?}}`
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::PlanNotFound { id: 7 }.exit_code(), 3);
        assert_eq!(Error::RequiredField("title").exit_code(), 4);
        assert_eq!(Error::Coach("boom".into()).exit_code(), 9);
        assert_eq!(Error::Other("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_invalid_parent_message() {
        let err = Error::InvalidParent {
            child: PlanType::Month,
            parent: PlanType::Year,
        };
        assert_eq!(err.to_string(), "A MONTH plan cannot sit under a YEAR plan");
        assert!(err.hint().unwrap().contains("QUARTER"));
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::MissingParent { plan_type: PlanType::Week }.to_structured_json();
        assert_eq!(json["error"]["code"], "MISSING_PARENT");
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].as_str().unwrap().contains("MONTH"));
    }
}
