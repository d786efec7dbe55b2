//! SQLite storage implementation.
//!
//! This module provides the plan store and the task store on one SQLite
//! connection. It follows the MutationContext pattern for transaction
//! discipline, audit logging and change notification.

use crate::error::{Error, Result};
use crate::model::{DayWindow, Plan, PlanNode, PlanType, Stats, Task, build_forest};
use crate::storage::events::{Event, EventType, get_events, insert_event};
use crate::storage::notify::{ChangeHub, Table};
use crate::storage::schema::apply_schema;
use crate::validate::{check_parent_rank, validate_title};
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const PLAN_COLUMNS: &str =
    "id, title, description, type, parent_id, is_completed, ai_coaching_tip, created_at";

const TASK_COLUMNS: &str = "id, title, is_completed, ai_feedback, date";

/// Rank order for `ORDER BY`. Sorting on the stored name would be alphabetical.
const PLAN_RANK_ORDER: &str = "CASE type
    WHEN 'FIVE_YEAR' THEN 0
    WHEN 'YEAR' THEN 1
    WHEN 'QUARTER' THEN 2
    WHEN 'MONTH' THEN 3
    ELSE 4 END";

/// SQLite-based storage backend.
///
/// Construct once per process and hand it to every consumer; there is no
/// global instance.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    changes: ChangeHub,
}

/// Context for a mutation operation, tracking side effects.
///
/// This struct is passed to mutation closures to:
/// - Record audit events for history
/// - Track which tables were written (published after commit)
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
    /// Tables written by this operation.
    pub touched: HashSet<Table>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
            touched: HashSet::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: i64, event_type: EventType) {
        self.events.push(Event::new(
            entity_type,
            &entity_id.to_string(),
            event_type,
            &self.actor,
        ));
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity_type: &str,
        entity_id: i64,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity_type, &entity_id.to_string(), event_type, &self.actor)
                .with_values(old_value, new_value),
        );
    }

    /// Mark a table as written.
    pub fn touch(&mut self, table: Table) {
        self.touched.insert(table);
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Default 5 second timeout
        conn.busy_timeout(timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis))?;

        apply_schema(&conn)?;
        Ok(Self {
            conn,
            changes: ChangeHub::default(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            changes: ChangeHub::default(),
        })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Change notifications for this store.
    #[must_use]
    pub fn changes(&self) -> &ChangeHub {
        &self.changes
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    /// 5. Publishes one change per touched table
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error
    /// and nothing is published.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        debug!(op, events = ctx.events.len(), tables = ctx.touched.len(), "Mutation committed");
        for table in ctx.touched {
            self.changes.publish(table);
        }

        Ok(result)
    }

    // ======================
    // Plan Operations
    // ======================

    /// Create a plan.
    ///
    /// The title must not be blank and the parent must sit exactly one rank
    /// above (5-year visions take no parent). A plan with `id == 0` gets a
    /// store-assigned id; any other id inserts or replaces that row.
    /// Replacing a row is held to the same rank rules as [`Self::update_plan`].
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ParentNotFound`, `InvalidArgument` when
    /// re-ranking a plan that has children, or a database error.
    pub fn create_plan(&mut self, plan: &Plan, actor: &str) -> Result<i64> {
        self.mutate("create_plan", actor, |tx, ctx| {
            let title = validate_title(&plan.title)?;
            check_plan_parent(tx, plan)?;

            let id = if plan.id > 0 {
                if let Some(old) = fetch_plan(tx, plan.id)? {
                    check_rerank(tx, &old, plan)?;
                }
                tx.execute(
                    "INSERT OR REPLACE INTO plans (id, title, description, type, parent_id, is_completed, ai_coaching_tip, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        plan.id,
                        title,
                        plan.description,
                        plan.plan_type.as_str(),
                        plan.parent_id,
                        plan.is_completed,
                        plan.ai_coaching_tip,
                        plan.created_at,
                    ],
                )?;
                plan.id
            } else {
                tx.execute(
                    "INSERT INTO plans (title, description, type, parent_id, is_completed, ai_coaching_tip, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        title,
                        plan.description,
                        plan.plan_type.as_str(),
                        plan.parent_id,
                        plan.is_completed,
                        plan.ai_coaching_tip,
                        plan.created_at,
                    ],
                )?;
                tx.last_insert_rowid()
            };

            ctx.record_change("plan", id, EventType::PlanCreated, None, Some(title));
            ctx.touch(Table::Plans);
            Ok(id)
        })
    }

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_plan(&self, id: i64) -> Result<Option<Plan>> {
        Ok(fetch_plan(&self.conn, id)?)
    }

    /// Replace a plan's stored fields by ID (creation time is kept).
    ///
    /// Returns `false` without writing anything when no plan has that ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `ParentNotFound`, `InvalidArgument` when
    /// re-ranking a plan that has children, or a database error.
    pub fn update_plan(&mut self, plan: &Plan, actor: &str) -> Result<bool> {
        self.mutate("update_plan", actor, |tx, ctx| {
            let Some(old) = fetch_plan(tx, plan.id)? else {
                return Ok(false);
            };

            let title = validate_title(&plan.title)?;
            check_plan_parent(tx, plan)?;
            check_rerank(tx, &old, plan)?;

            tx.execute(
                "UPDATE plans
                 SET title = ?1, description = ?2, type = ?3, parent_id = ?4, is_completed = ?5, ai_coaching_tip = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    title,
                    plan.description,
                    plan.plan_type.as_str(),
                    plan.parent_id,
                    plan.is_completed,
                    plan.ai_coaching_tip,
                    plan.id,
                ],
            )?;

            if old.is_completed != plan.is_completed {
                ctx.record_event("plan", plan.id, EventType::plan_completion(plan.is_completed));
            }
            if old.title == title {
                ctx.record_event("plan", plan.id, EventType::PlanUpdated);
            } else {
                ctx.record_change("plan", plan.id, EventType::PlanUpdated, Some(old.title), Some(title));
            }
            ctx.touch(Table::Plans);
            Ok(true)
        })
    }

    /// Set a plan's completion flag.
    ///
    /// Returns `false` when no plan has that ID. Setting the flag to its
    /// current value writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_plan_completed(&mut self, id: i64, completed: bool, actor: &str) -> Result<bool> {
        self.mutate("set_plan_completed", actor, |tx, ctx| {
            let Some(old) = fetch_plan(tx, id)? else {
                return Ok(false);
            };
            if old.is_completed == completed {
                return Ok(true);
            }

            tx.execute(
                "UPDATE plans SET is_completed = ?1 WHERE id = ?2",
                rusqlite::params![completed, id],
            )?;

            ctx.record_event("plan", id, EventType::plan_completion(completed));
            ctx.touch(Table::Plans);
            Ok(true)
        })
    }

    /// Delete a plan by ID.
    ///
    /// Children are not deleted: they stay listable by parent ID but are no
    /// longer reachable from a 5-year vision. Returns `false` when no plan has
    /// that ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_plan(&mut self, id: i64, actor: &str) -> Result<bool> {
        self.mutate("delete_plan", actor, |tx, ctx| {
            let Some(old) = fetch_plan(tx, id)? else {
                return Ok(false);
            };

            tx.execute("DELETE FROM plans WHERE id = ?1", [id])?;

            let orphaned = count_children(tx, id)?;
            if orphaned > 0 {
                debug!(plan_id = id, orphaned, "Deleted plan left children in place");
            }

            ctx.record_change("plan", id, EventType::PlanDeleted, Some(old.title), None);
            ctx.touch(Table::Plans);
            Ok(true)
        })
    }

    /// List plans of one rank, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_plans_by_type(&self, plan_type: PlanType) -> Result<Vec<Plan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE type = ?1 ORDER BY created_at DESC, id DESC"
        ))?;
        let plans = stmt
            .query_map([plan_type.as_str()], map_plan_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// List the direct children of a plan, newest first.
    ///
    /// Works for deleted parents too: orphans still answer to their old parent ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_child_plans(&self, parent_id: i64) -> Result<Vec<Plan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE parent_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?;
        let plans = stmt
            .query_map([parent_id], map_plan_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// List every plan, root rank first, newest first within a rank.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_plans(&self) -> Result<Vec<Plan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans ORDER BY {PLAN_RANK_ORDER} ASC, created_at DESC, id DESC"
        ))?;
        let plans = stmt
            .query_map([], map_plan_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// List non-root plans whose parent no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_orphan_plans(&self) -> Result<Vec<Plan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans AS p
             WHERE p.type != 'FIVE_YEAR'
               AND (p.parent_id IS NULL
                    OR NOT EXISTS (SELECT 1 FROM plans AS q WHERE q.id = p.parent_id))
             ORDER BY {PLAN_RANK_ORDER} ASC, p.created_at DESC, p.id DESC"
        ))?;
        let plans = stmt
            .query_map([], map_plan_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// Assemble the goal tree from every plan reachable from a 5-year vision.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn plan_tree(&self) -> Result<Vec<PlanNode>> {
        Ok(build_forest(self.list_all_plans()?))
    }

    /// Count plans of one rank, optionally only completed ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_plans_by_type(&self, plan_type: PlanType, completed_only: bool) -> Result<u64> {
        let sql = if completed_only {
            "SELECT COUNT(*) FROM plans WHERE type = ?1 AND is_completed = 1"
        } else {
            "SELECT COUNT(*) FROM plans WHERE type = ?1"
        };
        let count: i64 = self
            .conn
            .query_row(sql, [plan_type.as_str()], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Completion stats for one rank.
    ///
    /// # Errors
    ///
    /// Returns an error if either count fails.
    pub fn plan_stats(&self, plan_type: PlanType) -> Result<Stats> {
        Ok(Stats::new(
            self.count_plans_by_type(plan_type, true)?,
            self.count_plans_by_type(plan_type, false)?,
        ))
    }

    /// Completion stats for every rank, root first.
    ///
    /// # Errors
    ///
    /// Returns an error if any count fails.
    pub fn all_plan_stats(&self) -> Result<Vec<(PlanType, Stats)>> {
        PlanType::ALL
            .into_iter()
            .map(|t| self.plan_stats(t).map(|stats| (t, stats)))
            .collect()
    }

    // ======================
    // Task Operations
    // ======================

    /// Create a task.
    ///
    /// A task with `id == 0` gets a store-assigned id; any other id inserts
    /// or replaces that row.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField` for a blank title, or a database error.
    pub fn create_task(&mut self, task: &Task, actor: &str) -> Result<i64> {
        self.mutate("create_task", actor, |tx, ctx| {
            let title = validate_title(&task.title)?;

            let id = if task.id > 0 {
                tx.execute(
                    "INSERT OR REPLACE INTO tasks (id, title, is_completed, ai_feedback, date)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![task.id, title, task.is_completed, task.ai_feedback, task.date],
                )?;
                task.id
            } else {
                tx.execute(
                    "INSERT INTO tasks (title, is_completed, ai_feedback, date) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![title, task.is_completed, task.ai_feedback, task.date],
                )?;
                tx.last_insert_rowid()
            };

            ctx.record_change("task", id, EventType::TaskCreated, None, Some(title));
            ctx.touch(Table::Tasks);
            Ok(id)
        })
    }

    /// Get a task by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        Ok(fetch_task(&self.conn, id)?)
    }

    /// Replace a task's stored fields by ID.
    ///
    /// Returns `false` without writing anything when no task has that ID.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField` for a blank title, or a database error.
    pub fn update_task(&mut self, task: &Task, actor: &str) -> Result<bool> {
        self.mutate("update_task", actor, |tx, ctx| {
            let Some(old) = fetch_task(tx, task.id)? else {
                return Ok(false);
            };
            let title = validate_title(&task.title)?;

            tx.execute(
                "UPDATE tasks SET title = ?1, is_completed = ?2, ai_feedback = ?3, date = ?4 WHERE id = ?5",
                rusqlite::params![title, task.is_completed, task.ai_feedback, task.date, task.id],
            )?;

            if old.is_completed != task.is_completed {
                ctx.record_event("task", task.id, EventType::task_completion(task.is_completed));
            }
            if old.title == title {
                ctx.record_event("task", task.id, EventType::TaskUpdated);
            } else {
                ctx.record_change("task", task.id, EventType::TaskUpdated, Some(old.title), Some(title));
            }
            ctx.touch(Table::Tasks);
            Ok(true)
        })
    }

    /// Flip a task's completion flag in place, leaving every other field alone.
    ///
    /// Returns the updated task, or `None` when no task has that ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn toggle_task(&mut self, id: i64, actor: &str) -> Result<Option<Task>> {
        self.mutate("toggle_task", actor, |tx, ctx| {
            let affected = tx.execute(
                "UPDATE tasks SET is_completed = 1 - is_completed WHERE id = ?1",
                [id],
            )?;
            if affected == 0 {
                return Ok(None);
            }

            let task = fetch_task(tx, id)?;
            if let Some(task) = &task {
                ctx.record_event("task", id, EventType::task_completion(task.is_completed));
                ctx.touch(Table::Tasks);
            }
            Ok(task)
        })
    }

    /// Delete a task by ID. Returns `false` when no task has that ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_task(&mut self, id: i64, actor: &str) -> Result<bool> {
        self.mutate("delete_task", actor, |tx, ctx| {
            let Some(old) = fetch_task(tx, id)? else {
                return Ok(false);
            };

            tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;

            ctx.record_change("task", id, EventType::TaskDeleted, Some(old.title), None);
            ctx.touch(Table::Tasks);
            Ok(true)
        })
    }

    /// List tasks dated inside `[start, end)`, incomplete first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks_for_window(&self, start: i64, end: i64) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE date >= ?1 AND date < ?2
             ORDER BY is_completed ASC, id ASC"
        ))?;
        let tasks = stmt
            .query_map([start, end], map_task_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// List tasks for one local day.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks_for_day(&self, window: DayWindow) -> Result<Vec<Task>> {
        self.list_tasks_for_window(window.start, window.end)
    }

    /// List today's tasks (local time).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks_for_today(&self) -> Result<Vec<Task>> {
        self.list_tasks_for_day(DayWindow::today())
    }

    /// List every task, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY date DESC, id DESC"
        ))?;
        let tasks = stmt
            .query_map([], map_task_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Count completed tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_completed_tasks(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM tasks WHERE is_completed = 1")
    }

    /// Count all tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_total_tasks(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM tasks")
    }

    /// Completion stats over all tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if either count fails.
    pub fn task_stats(&self) -> Result<Stats> {
        Ok(Stats::new(self.count_completed_tasks()?, self.count_total_tasks()?))
    }

    fn count(&self, sql: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    // ======================
    // History
    // ======================

    /// Audit events for one plan or task, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_history(&self, entity_type: &str, id: i64, limit: Option<u32>) -> Result<Vec<Event>> {
        Ok(get_events(&self.conn, entity_type, &id.to_string(), limit)?)
    }
}

// ======================
// Row helpers
// ======================

fn map_plan_row(row: &Row) -> rusqlite::Result<Plan> {
    let raw_type: String = row.get(3)?;
    let plan_type = PlanType::parse(&raw_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown plan type: {raw_type}").into(),
        )
    })?;

    Ok(Plan {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        plan_type,
        parent_id: row.get(4)?,
        is_completed: row.get(5)?,
        ai_coaching_tip: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        is_completed: row.get(2)?,
        ai_feedback: row.get(3)?,
        date: row.get(4)?,
    })
}

fn fetch_plan(conn: &Connection, id: i64) -> rusqlite::Result<Option<Plan>> {
    conn.query_row(
        &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1"),
        [id],
        map_plan_row,
    )
    .optional()
}

fn fetch_task(conn: &Connection, id: i64) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        map_task_row,
    )
    .optional()
}

fn count_children(conn: &Connection, id: i64) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM plans WHERE parent_id = ?1", [id], |row| row.get(0))
}

fn has_children(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    Ok(count_children(conn, id)? > 0)
}

/// Resolve the parent's rank and enforce the one-rank-up edge.
///
/// A stored plan naming itself as parent would be checked against its own
/// pre-write rank, so that case is rejected up front.
fn check_plan_parent(conn: &Connection, plan: &Plan) -> Result<()> {
    if plan.id > 0 && plan.parent_id == Some(plan.id) {
        return Err(Error::InvalidArgument(format!(
            "plan {} cannot be its own parent",
            plan.id
        )));
    }
    let parent_type = match plan.parent_id {
        Some(parent_id) => {
            let parent = fetch_plan(conn, parent_id)?
                .ok_or(Error::ParentNotFound { id: parent_id })?;
            Some(parent.plan_type)
        }
        None => None,
    };
    check_parent_rank(plan.plan_type, parent_type)
}

/// Children pin their parent's rank.
fn check_rerank(conn: &Connection, old: &Plan, plan: &Plan) -> Result<()> {
    if old.plan_type != plan.plan_type && has_children(conn, old.id)? {
        return Err(Error::InvalidArgument(format!(
            "plan {} has children; its rank cannot change from {} to {}",
            old.id, old.plan_type, plan.plan_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, TimeZone};

    const ACTOR: &str = "test-actor";

    fn local_ms(date: NaiveDate, h: u32, m: u32) -> i64 {
        Local
            .from_local_datetime(&date.and_hms_opt(h, m, 0).unwrap())
            .earliest()
            .unwrap()
            .timestamp_millis()
    }

    /// Build a FIVE_YEAR → ... → WEEK chain and return ids root first.
    fn chain(storage: &mut SqliteStorage) -> Vec<i64> {
        let mut ids = Vec::new();
        let mut parent = None;
        for t in PlanType::ALL {
            let mut plan = Plan::new(format!("{} goal", t.label()), t);
            plan.parent_id = parent;
            let id = storage.create_plan(&plan, ACTOR).unwrap();
            ids.push(id);
            parent = Some(id);
        }
        ids
    }

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_five_year_plan_assigns_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let id = storage
            .create_plan(&Plan::new("Get Fit", PlanType::FiveYear), ACTOR)
            .unwrap();
        assert!(id > 0);

        let plans = storage.list_plans_by_type(PlanType::FiveYear).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, id);
        assert_eq!(plans[0].title, "Get Fit");
        assert!(plans[0].parent_id.is_none());
    }

    #[test]
    fn test_create_plan_trims_and_rejects_blank_title() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let id = storage
            .create_plan(&Plan::new("  Learn Rust  ", PlanType::FiveYear), ACTOR)
            .unwrap();
        assert_eq!(storage.get_plan(id).unwrap().unwrap().title, "Learn Rust");

        let err = storage
            .create_plan(&Plan::new("   ", PlanType::FiveYear), ACTOR)
            .unwrap_err();
        assert!(matches!(err, Error::RequiredField("title")));
        assert_eq!(storage.list_all_plans().unwrap().len(), 1);
    }

    #[test]
    fn test_create_plan_enforces_rank_edges() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let vision = storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear), ACTOR)
            .unwrap();

        // Non-root without parent
        let err = storage
            .create_plan(&Plan::new("Annual", PlanType::Year), ACTOR)
            .unwrap_err();
        assert!(matches!(err, Error::MissingParent { plan_type: PlanType::Year }));

        // Skipping a rank
        let err = storage
            .create_plan(&Plan::new("Quarter", PlanType::Quarter).with_parent(vision), ACTOR)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParent { child: PlanType::Quarter, parent: PlanType::FiveYear }
        ));

        // Root with a parent
        let err = storage
            .create_plan(&Plan::new("Nested vision", PlanType::FiveYear).with_parent(vision), ACTOR)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParent { .. }));

        // Dangling parent
        let err = storage
            .create_plan(&Plan::new("Annual", PlanType::Year).with_parent(999), ACTOR)
            .unwrap_err();
        assert!(matches!(err, Error::ParentNotFound { id: 999 }));

        // Correct edge
        let year = storage
            .create_plan(&Plan::new("Annual", PlanType::Year).with_parent(vision), ACTOR)
            .unwrap();
        assert_eq!(storage.get_plan(year).unwrap().unwrap().parent_id, Some(vision));
    }

    #[test]
    fn test_every_parent_is_one_rank_up() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        chain(&mut storage);
        chain(&mut storage);

        let plans = storage.list_all_plans().unwrap();
        assert_eq!(plans.len(), 10);
        for plan in &plans {
            match plan.parent_id {
                None => assert_eq!(plan.plan_type, PlanType::FiveYear),
                Some(pid) => {
                    let parent = storage.get_plan(pid).unwrap().unwrap();
                    assert_eq!(parent.plan_type.level() + 1, plan.plan_type.level());
                }
            }
        }
    }

    #[test]
    fn test_create_with_explicit_id_replaces() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create_plan(&Plan::new("Draft", PlanType::FiveYear), ACTOR)
            .unwrap();

        let mut replacement = Plan::new("Final", PlanType::FiveYear);
        replacement.id = id;
        assert_eq!(storage.create_plan(&replacement, ACTOR).unwrap(), id);

        let plans = storage.list_all_plans().unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Final");
    }

    #[test]
    fn test_list_orders() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let old = storage
            .create_plan(&Plan::new("Old", PlanType::FiveYear).with_created_at(1_000), ACTOR)
            .unwrap();
        let new = storage
            .create_plan(&Plan::new("New", PlanType::FiveYear).with_created_at(2_000), ACTOR)
            .unwrap();
        let year = storage
            .create_plan(
                &Plan::new("Year", PlanType::Year).with_parent(old).with_created_at(3_000),
                ACTOR,
            )
            .unwrap();

        let visions: Vec<i64> = storage
            .list_plans_by_type(PlanType::FiveYear)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(visions, vec![new, old]);

        // Rank order, not alphabetical: FIVE_YEAR before YEAR
        let all: Vec<i64> = storage.list_all_plans().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(all, vec![new, old, year]);
    }

    #[test]
    fn test_list_all_plans_sorts_by_rank_not_name() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let ids = chain(&mut storage);

        let types: Vec<PlanType> = storage
            .list_all_plans()
            .unwrap()
            .iter()
            .map(|p| p.plan_type)
            .collect();
        assert_eq!(types, PlanType::ALL.to_vec());
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_update_plan() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear).with_created_at(42), ACTOR)
            .unwrap();

        let mut plan = storage.get_plan(id).unwrap().unwrap();
        plan.title = "Sharper vision".to_string();
        plan.description = "Run a marathon".to_string();
        plan.ai_coaching_tip = Some("Stop talking, start running".to_string());
        plan.created_at = 9_999;
        assert!(storage.update_plan(&plan, ACTOR).unwrap());

        let stored = storage.get_plan(id).unwrap().unwrap();
        assert_eq!(stored.title, "Sharper vision");
        assert_eq!(stored.description, "Run a marathon");
        assert_eq!(stored.ai_coaching_tip.as_deref(), Some("Stop talking, start running"));
        assert_eq!(stored.created_at, 42);
    }

    #[test]
    fn test_update_missing_plan_is_noop() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut rx = storage.changes().subscribe();

        let mut ghost = Plan::new("Ghost", PlanType::FiveYear);
        ghost.id = 77;
        assert!(!storage.update_plan(&ghost, ACTOR).unwrap());
        assert!(storage.list_all_plans().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_update_cannot_rerank_plan_with_children() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let ids = chain(&mut storage);

        let mut year = storage.get_plan(ids[1]).unwrap().unwrap();
        year.plan_type = PlanType::FiveYear;
        year.parent_id = None;
        let err = storage.update_plan(&year, ACTOR).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_update_rejects_self_parent() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear), ACTOR)
            .unwrap();

        let mut plan = storage.get_plan(id).unwrap().unwrap();
        plan.plan_type = PlanType::Year;
        plan.parent_id = Some(id);
        let err = storage.update_plan(&plan, ACTOR).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let stored = storage.get_plan(id).unwrap().unwrap();
        assert_eq!(stored.plan_type, PlanType::FiveYear);
        assert_eq!(stored.parent_id, None);
    }

    #[test]
    fn test_replace_cannot_rerank_plan_with_children() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let ids = chain(&mut storage);
        let (vision, year) = (ids[0], ids[1]);
        let other = storage
            .create_plan(&Plan::new("Other vision", PlanType::FiveYear), ACTOR)
            .unwrap();

        let mut replacement = Plan::new("Demoted", PlanType::Year).with_parent(other);
        replacement.id = vision;
        let err = storage.create_plan(&replacement, ACTOR).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let stored = storage.get_plan(vision).unwrap().unwrap();
        assert_eq!(stored.plan_type, PlanType::FiveYear);
        let child = storage.get_plan(year).unwrap().unwrap();
        assert_eq!(child.parent_id, Some(vision));

        // Same rank, same edges: replacement is allowed
        let mut renamed = Plan::new("Renamed vision", PlanType::FiveYear);
        renamed.id = vision;
        assert_eq!(storage.create_plan(&renamed, ACTOR).unwrap(), vision);
        assert_eq!(storage.get_plan(vision).unwrap().unwrap().title, "Renamed vision");
    }

    #[test]
    fn test_replace_rejects_self_parent() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear), ACTOR)
            .unwrap();

        let mut replacement = Plan::new("Loop", PlanType::Year).with_parent(id);
        replacement.id = id;
        let err = storage.create_plan(&replacement, ACTOR).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(storage.get_plan(id).unwrap().unwrap().plan_type, PlanType::FiveYear);
    }

    #[test]
    fn test_delete_plan_keeps_children() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let ids = chain(&mut storage);
        let (vision, year) = (ids[0], ids[1]);

        assert!(storage.delete_plan(vision, ACTOR).unwrap());
        assert!(storage.get_plan(vision).unwrap().is_none());

        // Orphan still listable by its old parent id
        let children = storage.list_child_plans(vision).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, year);

        // ...but unreachable from any root
        assert!(storage.plan_tree().unwrap().is_empty());
        let orphans = storage.list_orphan_plans().unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, year);

        assert_eq!(storage.list_all_plans().unwrap().len(), 4);
        assert!(!storage.delete_plan(vision, ACTOR).unwrap());
    }

    #[test]
    fn test_plan_counts_and_stats() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        assert_eq!(storage.plan_stats(PlanType::Year).unwrap(), Stats::new(0, 0));
        assert!(storage.plan_stats(PlanType::Year).unwrap().ratio().abs() < f64::EPSILON);

        let vision = storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear), ACTOR)
            .unwrap();
        let a = storage
            .create_plan(&Plan::new("A", PlanType::Year).with_parent(vision), ACTOR)
            .unwrap();
        storage
            .create_plan(&Plan::new("B", PlanType::Year).with_parent(vision), ACTOR)
            .unwrap();
        assert!(storage.set_plan_completed(a, true, ACTOR).unwrap());

        assert_eq!(storage.count_plans_by_type(PlanType::Year, true).unwrap(), 1);
        assert_eq!(storage.count_plans_by_type(PlanType::Year, false).unwrap(), 2);
        assert_eq!(storage.plan_stats(PlanType::Year).unwrap(), Stats::new(1, 2));

        for (t, stats) in storage.all_plan_stats().unwrap() {
            assert!(stats.completed <= stats.total, "{t}");
        }
    }

    #[test]
    fn test_set_plan_completed_records_history() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear), ACTOR)
            .unwrap();

        assert!(storage.set_plan_completed(id, true, ACTOR).unwrap());
        assert!(storage.set_plan_completed(id, true, ACTOR).unwrap());
        assert!(storage.set_plan_completed(id, false, ACTOR).unwrap());
        assert!(!storage.set_plan_completed(404, true, ACTOR).unwrap());

        let history = storage.get_history("plan", id, None).unwrap();
        let kinds: Vec<EventType> = history.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![EventType::PlanReopened, EventType::PlanCompleted, EventType::PlanCreated]
        );
    }

    #[test]
    fn test_task_crud() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let id = storage.create_task(&Task::new("Run 5k"), ACTOR).unwrap();
        assert!(id > 0);

        let mut task = storage.get_task(id).unwrap().unwrap();
        task.title = "Run 10k".to_string();
        task.ai_feedback = Some("Legs of steel".to_string());
        assert!(storage.update_task(&task, ACTOR).unwrap());
        assert_eq!(storage.get_task(id).unwrap().unwrap(), task);

        let mut ghost = Task::new("Ghost");
        ghost.id = 404;
        assert!(!storage.update_task(&ghost, ACTOR).unwrap());

        assert!(storage.delete_task(id, ACTOR).unwrap());
        assert!(storage.get_task(id).unwrap().is_none());
        assert!(!storage.delete_task(id, ACTOR).unwrap());

        assert!(matches!(
            storage.create_task(&Task::new(" "), ACTOR),
            Err(Error::RequiredField("title"))
        ));
    }

    #[test]
    fn test_toggle_task_twice_restores_state() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create_task(&Task::new("Run 5k").with_feedback("Go"), ACTOR)
            .unwrap();
        let original = storage.get_task(id).unwrap().unwrap();

        let once = storage.toggle_task(id, ACTOR).unwrap().unwrap();
        assert!(once.is_completed);
        let today = storage.list_tasks_for_today().unwrap();
        assert!(today.iter().find(|t| t.id == id).unwrap().is_completed);

        let twice = storage.toggle_task(id, ACTOR).unwrap().unwrap();
        assert_eq!(twice, original);

        assert!(storage.toggle_task(404, ACTOR).unwrap().is_none());
    }

    #[test]
    fn test_day_window_ignores_time_of_day() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let prev = NaiveDate::from_ymd_opt(2024, 5, 9).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();

        let early = storage
            .create_task(&Task::new("Early").with_date(local_ms(day, 0, 0)), ACTOR)
            .unwrap();
        let late = storage
            .create_task(&Task::new("Late").with_date(local_ms(day, 23, 59)), ACTOR)
            .unwrap();
        storage
            .create_task(&Task::new("Yesterday").with_date(local_ms(prev, 23, 59)), ACTOR)
            .unwrap();
        storage
            .create_task(&Task::new("Tomorrow").with_date(local_ms(next, 0, 0)), ACTOR)
            .unwrap();

        let ids: Vec<i64> = storage
            .list_tasks_for_day(DayWindow::for_date(day))
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[test]
    fn test_window_lists_incomplete_first() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let done = storage.create_task(&Task::new("Done"), ACTOR).unwrap();
        let open = storage.create_task(&Task::new("Open"), ACTOR).unwrap();
        storage.toggle_task(done, ACTOR).unwrap();

        let ids: Vec<i64> = storage
            .list_tasks_for_today()
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![open, done]);
    }

    #[test]
    fn test_list_all_tasks_newest_first() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let old = storage.create_task(&Task::new("Old").with_date(1_000), ACTOR).unwrap();
        let new = storage.create_task(&Task::new("New").with_date(5_000), ACTOR).unwrap();

        let ids: Vec<i64> = storage.list_all_tasks().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![new, old]);
    }

    #[test]
    fn test_task_stats() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        assert_eq!(storage.task_stats().unwrap(), Stats::default());

        let a = storage.create_task(&Task::new("A"), ACTOR).unwrap();
        storage.create_task(&Task::new("B"), ACTOR).unwrap();
        storage.toggle_task(a, ACTOR).unwrap();

        assert_eq!(storage.count_completed_tasks().unwrap(), 1);
        assert_eq!(storage.count_total_tasks().unwrap(), 2);
        assert_eq!(storage.task_stats().unwrap().percent(), 50);
    }

    #[test]
    fn test_mutations_publish_table_changes() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut rx = storage.changes().subscribe();

        storage.create_task(&Task::new("Run"), ACTOR).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Table::Tasks);

        storage
            .create_plan(&Plan::new("Vision", PlanType::FiveYear), ACTOR)
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), Table::Plans);

        // Failed validation rolls back and publishes nothing
        let _ = storage.create_plan(&Plan::new("", PlanType::FiveYear), ACTOR);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_open_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage
                .create_plan(&Plan::new("Persist me", PlanType::FiveYear), ACTOR)
                .unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        let plans = storage.list_plans_by_type(PlanType::FiveYear).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Persist me");
    }
}
