//! Table change notifications.
//!
//! Every committed write publishes one [`Table`] event per table it touched.
//! Live queries subscribe and re-run when a table they read from changes.
//! Invalidation is table-level, not row-level.

use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity (events).
///
/// A lagging subscriber only needs to know that *something* changed, so a
/// small buffer is enough.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A table whose contents changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Plans,
    Tasks,
}

impl Table {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plans => "plans",
            Self::Tasks => "tasks",
        }
    }
}

/// Publish/subscribe hub for table changes.
///
/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<Table>,
}

impl ChangeHub {
    /// Create a hub with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Announce that `table` changed.
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn publish(&self, table: Table) {
        debug!(table = table.as_str(), subscribers = self.tx.receiver_count(), "ChangeHub::publish");
        let _ = self.tx.send(table);
    }

    /// Receive every change published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Table> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
