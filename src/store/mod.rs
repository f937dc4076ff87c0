//! Persistent contact store.
//!
//! The reconciliation engine only talks to the store through
//! [`ContactStore`]. [`SqliteContactStore`] is the production
//! implementation.

mod sqlite;

pub use sqlite::SqliteContactStore;

use std::collections::HashMap;
use thiserror::Error;

use crate::models::{Contact, SyncOutcome};
use crate::reconcile::NameUpdate;

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to create database directory '{0}': {1}")]
    CreateDir(String, std::io::Error),

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow {
        table: &'static str,
        message: String,
    },
}

/// Identity keys that collided with existing rows during a bulk insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateKeyConflict {
    pub keys: Vec<String>,
}

/// Result of an unordered bulk insert.
///
/// Duplicate-key collisions do not fail the batch; they are reported in
/// `conflict` while the remaining documents are still inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertResult {
    pub inserted: u64,
    pub conflict: Option<DuplicateKeyConflict>,
}

/// Result of an unordered bulk update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateResult {
    /// Rows whose value actually changed. A matched row already holding the
    /// new value is not counted.
    pub modified: u64,
}

/// Store operations used by a sync run.
#[allow(async_fn_in_trait)]
pub trait ContactStore {
    /// Reads every stored `identity_key -> full_name` pair in one request.
    async fn load_identities(&self) -> Result<HashMap<String, String>, StoreError>;

    /// Inserts all contacts, continuing past duplicate-key collisions.
    async fn insert_unordered(&self, contacts: &[Contact])
        -> Result<BulkInsertResult, StoreError>;

    /// Sets `full_name` for each matching `identity_key`.
    async fn update_names_unordered(
        &self,
        updates: &[NameUpdate],
    ) -> Result<BulkUpdateResult, StoreError>;

    /// Appends one audit record to `sync_runs`.
    async fn append_run(&self, outcome: &SyncOutcome) -> Result<(), StoreError>;
}
