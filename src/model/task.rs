//! Daily task model and day windows.

use chrono::{Days, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// A date-scoped action item. Tasks are independent of the plan tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier (0 until inserted)
    pub id: i64,

    /// Task title
    pub title: String,

    /// Completion flag
    pub is_completed: bool,

    /// Feedback note attached on completion
    pub ai_feedback: Option<String>,

    /// Day the task belongs to (Unix milliseconds, defaults to creation time)
    pub date: i64,
}

impl Task {
    /// Create a new, unsaved task dated now.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            is_completed: false,
            ai_feedback: None,
            date: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Set the task date.
    #[must_use]
    pub fn with_date(mut self, date: i64) -> Self {
        self.date = date;
        self
    }

    /// Attach a feedback note.
    #[must_use]
    pub fn with_feedback(mut self, feedback: &str) -> Self {
        self.ai_feedback = Some(feedback.to_string());
        self
    }

    /// Copy with only the completion flag flipped.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }
}

/// Half-open `[start, end)` interval of Unix milliseconds covering one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    pub start: i64,
    pub end: i64,
}

impl DayWindow {
    /// Window from local midnight of `date` to local midnight of the next day.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self {
            start: local_midnight(date),
            end: local_midnight(next),
        }
    }

    /// Window for the current local date.
    #[must_use]
    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    /// Whether `ts` falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Local midnight of `date` in Unix milliseconds.
///
/// On days where midnight falls into a DST gap, the earliest valid instant
/// after the gap is used.
fn local_midnight(date: NaiveDate) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp_millis(),
        None => {
            let shifted = naive + chrono::Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| naive.and_utc().timestamp_millis(), |dt| dt.timestamp_millis())
        }
    }
}
