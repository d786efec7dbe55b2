//! Observable query results.
//!
//! A [`LiveQuery`] wraps one read against the store and re-runs it whenever
//! a table it depends on changes. Consumers pull new values with
//! [`LiveQuery::next`] (async) or [`LiveQuery::try_next`] (non-blocking).

use crate::error::{Error, Result};
use crate::storage::{SqliteStorage, Table};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

type QueryFn<T> = Box<dyn Fn(&SqliteStorage) -> Result<T> + Send + Sync>;

/// Latest result of a store query, refreshed on relevant table changes.
///
/// Holds `T::default()` until the first emission. Dropping the value ends
/// the subscription.
pub struct LiveQuery<T> {
    name: &'static str,
    store: Arc<Mutex<SqliteStorage>>,
    query: QueryFn<T>,
    tables: &'static [Table],
    rx: broadcast::Receiver<Table>,
    value: T,
    emitted: bool,
}

impl<T: Default> LiveQuery<T> {
    pub(crate) fn new<F>(
        name: &'static str,
        store: Arc<Mutex<SqliteStorage>>,
        rx: broadcast::Receiver<Table>,
        tables: &'static [Table],
        query: F,
    ) -> Self
    where
        F: Fn(&SqliteStorage) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            store,
            query: Box::new(query),
            tables,
            rx,
            value: T::default(),
            emitted: false,
        }
    }

    /// Most recent value (default before the first emission).
    #[must_use]
    pub fn current(&self) -> &T {
        &self.value
    }

    /// Wait for the next value.
    ///
    /// The first call emits a fresh snapshot immediately. Later calls wait
    /// for a change to a table this query reads, then re-query. Returns
    /// `None` once the store's change hub is gone.
    pub async fn next(&mut self) -> Option<&T> {
        if self.emitted {
            loop {
                match self.rx.recv().await {
                    Ok(table) if self.tables.contains(&table) => break,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(query = self.name, skipped, "Live query lagged, re-querying");
                        break;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
            // One re-query covers every change already queued
            self.drain();
        }

        self.refresh();
        Some(&self.value)
    }

    /// Emit a new value if one is due, without waiting.
    ///
    /// Returns `Some` on the first call and whenever a relevant change is
    /// pending; `None` otherwise.
    pub fn try_next(&mut self) -> Option<&T> {
        if !self.drain() && self.emitted {
            return None;
        }
        self.refresh();
        Some(&self.value)
    }

    /// Consume queued notifications; report whether any touched our tables.
    fn drain(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.rx.try_recv() {
                Ok(table) => dirty |= self.tables.contains(&table),
                Err(TryRecvError::Lagged(_)) => dirty = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return dirty,
            }
        }
    }

    fn refresh(&mut self) {
        self.emitted = true;
        let result = self
            .store
            .lock()
            .map_err(|_| Error::Other("storage lock poisoned".into()))
            .and_then(|store| (self.query)(&*store));

        match result {
            Ok(value) => self.value = value,
            Err(e) => warn!(query = self.name, error = %e, "Live query failed, keeping previous value"),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("name", &self.name)
            .field("tables", &self.tables)
            .field("value", &self.value)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}
