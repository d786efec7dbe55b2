//! SQLite storage layer for growth plans.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Table-level change notification after commit
//! - Audit events for history
//!
//! # Submodules
//!
//! - [`events`] - Audit event storage
//! - [`notify`] - Change hub for live queries
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main SQLite storage implementation

pub mod events;
pub mod migrations;
pub mod notify;
pub mod schema;
pub mod sqlite;

pub use events::{Event, EventType};
pub use notify::{ChangeHub, Table};
pub use sqlite::{MutationContext, SqliteStorage};
