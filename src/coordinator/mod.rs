//! View-state coordinator.
//!
//! Turns store queries into long-lived [`LiveQuery`] values and forwards
//! user intents to the store. It holds no authoritative state and applies
//! no rules of its own: validation happens at the store boundary.

mod live;

pub use live::LiveQuery;

use crate::error::{Error, Result};
use crate::model::{Plan, PlanNode, PlanType, Stats, Task};
use crate::storage::{ChangeHub, SqliteStorage, Table};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const PLANS: &[Table] = &[Table::Plans];
const TASKS: &[Table] = &[Table::Tasks];

/// Shared entry point for presentation code.
///
/// Cloning shares the same store.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<Mutex<SqliteStorage>>,
    changes: ChangeHub,
    actor: String,
}

impl Coordinator {
    /// Wrap an open store.
    #[must_use]
    pub fn new(storage: SqliteStorage, actor: impl Into<String>) -> Self {
        let changes = storage.changes().clone();
        Self {
            store: Arc::new(Mutex::new(storage)),
            changes,
            actor: actor.into(),
        }
    }

    /// Open the database at `path` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &Path, actor: impl Into<String>) -> Result<Self> {
        Ok(Self::new(SqliteStorage::open(path)?, actor))
    }

    /// Actor recorded on every write.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Run a one-off read against the store.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or `Error::Other` if the store lock is
    /// poisoned.
    pub fn read<R>(&self, f: impl FnOnce(&SqliteStorage) -> Result<R>) -> Result<R> {
        f(&*self.lock()?)
    }

    fn write<R>(&self, f: impl FnOnce(&mut SqliteStorage, &str) -> Result<R>) -> Result<R> {
        f(&mut *self.lock()?, &self.actor)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteStorage>> {
        self.store
            .lock()
            .map_err(|_| Error::Other("storage lock poisoned".into()))
    }

    fn live<T, F>(&self, name: &'static str, tables: &'static [Table], query: F) -> LiveQuery<T>
    where
        T: Default,
        F: Fn(&SqliteStorage) -> Result<T> + Send + Sync + 'static,
    {
        LiveQuery::new(name, Arc::clone(&self.store), self.changes.subscribe(), tables, query)
    }

    // ======================
    // Queries
    // ======================

    /// 5-year visions, newest first.
    #[must_use]
    pub fn five_year_plans(&self) -> LiveQuery<Vec<Plan>> {
        self.plans_by_type(PlanType::FiveYear)
    }

    /// Plans of one rank, newest first.
    #[must_use]
    pub fn plans_by_type(&self, plan_type: PlanType) -> LiveQuery<Vec<Plan>> {
        self.live("plans_by_type", PLANS, move |s| s.list_plans_by_type(plan_type))
    }

    /// Every plan, root rank first.
    #[must_use]
    pub fn all_plans(&self) -> LiveQuery<Vec<Plan>> {
        self.live("all_plans", PLANS, SqliteStorage::list_all_plans)
    }

    /// Direct children of one plan.
    #[must_use]
    pub fn child_plans(&self, parent_id: i64) -> LiveQuery<Vec<Plan>> {
        self.live("child_plans", PLANS, move |s| s.list_child_plans(parent_id))
    }

    /// The goal tree rooted at the 5-year visions.
    #[must_use]
    pub fn plan_tree(&self) -> LiveQuery<Vec<PlanNode>> {
        self.live("plan_tree", PLANS, SqliteStorage::plan_tree)
    }

    /// Today's tasks, incomplete first.
    ///
    /// The day window is recomputed on every refresh, so a value emitted
    /// after midnight covers the new day.
    #[must_use]
    pub fn today_tasks(&self) -> LiveQuery<Vec<Task>> {
        self.live("today_tasks", TASKS, SqliteStorage::list_tasks_for_today)
    }

    /// Completion stats for one rank.
    #[must_use]
    pub fn plan_stats(&self, plan_type: PlanType) -> LiveQuery<Stats> {
        self.live("plan_stats", PLANS, move |s| s.plan_stats(plan_type))
    }

    /// Completion stats over all tasks.
    #[must_use]
    pub fn task_stats(&self) -> LiveQuery<Stats> {
        self.live("task_stats", TASKS, SqliteStorage::task_stats)
    }

    // ======================
    // Intents
    // ======================

    /// Add a plan; returns its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or a wrong parent.
    pub fn add_plan(&self, plan: &Plan) -> Result<i64> {
        self.write(|s, actor| s.create_plan(plan, actor))
    }

    /// Delete a plan. Its children are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn delete_plan(&self, plan: &Plan) -> Result<bool> {
        self.write(|s, actor| s.delete_plan(plan.id, actor))
    }

    /// Replace a plan's editable fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or a wrong parent.
    pub fn update_plan(&self, plan: &Plan) -> Result<bool> {
        self.write(|s, actor| s.update_plan(plan, actor))
    }

    /// Mark a plan complete or reopen it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn set_plan_completed(&self, plan: &Plan, completed: bool) -> Result<bool> {
        self.write(|s, actor| s.set_plan_completed(plan.id, completed, actor))
    }

    /// Add a task dated now; returns its id.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField` for a blank title.
    pub fn add_task(&self, title: &str) -> Result<i64> {
        self.write(|s, actor| s.create_task(&Task::new(title), actor))
    }

    /// Add a fully specified task (e.g. dated another day); returns its id.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField` for a blank title.
    pub fn add_dated_task(&self, task: &Task) -> Result<i64> {
        self.write(|s, actor| s.create_task(task, actor))
    }

    /// Flip a task's completion flag by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn toggle_task(&self, task: &Task) -> Result<Option<Task>> {
        self.write(|s, actor| s.toggle_task(task.id, actor))
    }

    /// Replace a task's fields.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField` for a blank title.
    pub fn update_task(&self, task: &Task) -> Result<bool> {
        self.write(|s, actor| s.update_task(task, actor))
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn delete_task(&self, task: &Task) -> Result<bool> {
        self.write(|s, actor| s.delete_task(task.id, actor))
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}
