//! Per-entity history of plan and task mutations.
//!
//! Rows are written inside the mutating transaction, so a rolled-back
//! change leaves no trace here.

use rusqlite::{Connection, Result};

/// What happened to a plan or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Plan events
    PlanCreated,
    PlanUpdated,
    PlanCompleted,
    PlanReopened,
    PlanDeleted,

    // Task events
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskReopened,
    TaskDeleted,
}

impl EventType {
    const ALL: [Self; 10] = [
        Self::PlanCreated,
        Self::PlanUpdated,
        Self::PlanCompleted,
        Self::PlanReopened,
        Self::PlanDeleted,
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskCompleted,
        Self::TaskReopened,
        Self::TaskDeleted,
    ];

    /// Name stored in the `event_type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlanCreated => "plan_created",
            Self::PlanUpdated => "plan_updated",
            Self::PlanCompleted => "plan_completed",
            Self::PlanReopened => "plan_reopened",
            Self::PlanDeleted => "plan_deleted",
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::TaskCompleted => "task_completed",
            Self::TaskReopened => "task_reopened",
            Self::TaskDeleted => "task_deleted",
        }
    }

    /// Completion transition event for plans.
    #[must_use]
    pub const fn plan_completion(completed: bool) -> Self {
        if completed { Self::PlanCompleted } else { Self::PlanReopened }
    }

    /// Completion transition event for tasks.
    #[must_use]
    pub const fn task_completion(completed: bool) -> Self {
        if completed { Self::TaskCompleted } else { Self::TaskReopened }
    }
}

/// One row of the `events` table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Event {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(serialize_with = "serialize_event_type")]
    pub event_type: EventType,
    pub actor: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub comment: Option<String>,
    pub created_at: i64,
}

fn serialize_event_type<S: serde::Serializer>(
    event_type: &EventType,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(event_type.as_str())
}

impl Event {
    /// Build an unsaved event stamped with the current time.
    #[must_use]
    pub fn new(entity_type: &str, entity_id: &str, event_type: EventType, actor: &str) -> Self {
        Self {
            id: 0,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            event_type,
            actor: actor.to_string(),
            old_value: None,
            new_value: None,
            comment: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Attach the before/after value of a changed field.
    #[must_use]
    pub fn with_values(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_value = old;
        self.new_value = new;
        self
    }

}

/// Append an event and return its row id.
///
/// # Errors
///
/// Propagates any `SQLite` failure.
pub fn insert_event(conn: &Connection, event: &Event) -> Result<i64> {
    conn.execute(
        "INSERT INTO events (entity_type, entity_id, event_type, actor, old_value, new_value, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            event.entity_type,
            event.entity_id,
            event.event_type.as_str(),
            event.actor,
            event.old_value,
            event.new_value,
            event.comment,
            event.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// History of one entity, newest first, capped at `limit` (default 100).
///
/// # Errors
///
/// Fails on `SQLite` errors or an unrecognized `event_type` value.
pub fn get_events(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
    limit: Option<u32>,
) -> Result<Vec<Event>> {
    let limit = limit.unwrap_or(100);
    let mut stmt = conn.prepare(
        "SELECT id, entity_type, entity_id, event_type, actor, old_value, new_value, comment, created_at
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY created_at DESC, id DESC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(rusqlite::params![entity_type, entity_id, limit], |row| {
        let raw: String = row.get(3)?;
        let event_type = parse_event_type(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown event type: {raw}").into(),
            )
        })?;
        Ok(Event {
            id: row.get(0)?,
            entity_type: row.get(1)?,
            entity_id: row.get(2)?,
            event_type,
            actor: row.get(4)?,
            old_value: row.get(5)?,
            new_value: row.get(6)?,
            comment: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;

    rows.collect()
}

fn parse_event_type(s: &str) -> Option<EventType> {
    EventType::ALL.into_iter().find(|t| t.as_str() == s)
}
