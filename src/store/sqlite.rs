use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use super::{
    BulkInsertResult, BulkUpdateResult, ContactStore, DuplicateKeyConflict, StoreError,
};
use crate::models::{Contact, StoredContact, SyncOutcome};
use crate::reconcile::NameUpdate;

/// SQLite-backed contact store.
///
/// Owns a connection pool opened by [`SqliteContactStore::connect`];
/// call [`SqliteContactStore::close`] before the process exits.
#[derive(Debug, Clone)]
pub struct SqliteContactStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    identity_key: String,
    full_name: String,
    notes: Option<String>,
    visible: bool,
    created_at: String,
    updated_at: String,
}

#[derive(sqlx::FromRow)]
struct SyncRunRow {
    id: String,
    total_seen: i64,
    inserted: i64,
    updated: i64,
    skipped: i64,
    success: bool,
    error_message: Option<String>,
    created_at: String,
}

impl SqliteContactStore {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::CreateDir(parent.display().to_string(), e))?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::debug!("Opened contact store at {}", path.display());
        Ok(Self { pool })
    }

    /// Closes the pool, waiting for in-flight queries to finish.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Contact store closed");
    }

    /// Lists stored contacts ordered by name.
    pub async fn list_contacts(&self) -> Result<Vec<StoredContact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT identity_key, full_name, notes, visible, created_at, updated_at
            FROM contacts
            WHERE identity_key IS NOT NULL
            ORDER BY full_name, identity_key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StoredContact {
                identity_key: row.identity_key,
                full_name: row.full_name,
                notes: row.notes,
                visible: row.visible,
                created_at: parse_timestamp(&row.created_at),
                updated_at: parse_timestamp(&row.updated_at),
            })
            .collect())
    }

    /// Lists the most recent sync runs, newest first.
    pub async fn list_runs(&self, limit: u32) -> Result<Vec<SyncOutcome>, StoreError> {
        let rows: Vec<SyncRunRow> = sqlx::query_as(
            r#"
            SELECT id, total_seen, inserted, updated, skipped, success, error_message, created_at
            FROM sync_runs
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id = Uuid::parse_str(&row.id).map_err(|e| StoreError::CorruptRow {
                    table: "sync_runs",
                    message: format!("invalid id '{}': {}", row.id, e),
                })?;
                Ok(SyncOutcome {
                    id,
                    total_seen: to_count(row.total_seen),
                    inserted: to_count(row.inserted),
                    updated: to_count(row.updated),
                    skipped: to_count(row.skipped),
                    success: row.success,
                    error_message: row.error_message,
                    created_at: parse_timestamp(&row.created_at),
                })
            })
            .collect()
    }
}

impl ContactStore for SqliteContactStore {
    async fn load_identities(&self) -> Result<HashMap<String, String>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT identity_key, full_name FROM contacts WHERE identity_key IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn insert_unordered(
        &self,
        contacts: &[Contact],
    ) -> Result<BulkInsertResult, StoreError> {
        if contacts.is_empty() {
            return Ok(BulkInsertResult::default());
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        let mut conflicting_keys = Vec::new();

        for contact in contacts {
            let result = sqlx::query(
                r#"
                INSERT INTO contacts (identity_key, full_name, visible, created_at, updated_at)
                VALUES (?, ?, 1, ?, ?)
                "#,
            )
            .bind(contact.identity_key())
            .bind(contact.full_name())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await;

            // A failed statement only rolls back itself, so siblings keep going.
            match result {
                Ok(done) => inserted += done.rows_affected(),
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    conflicting_keys.push(contact.identity_key().to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;

        let conflict = if conflicting_keys.is_empty() {
            None
        } else {
            Some(DuplicateKeyConflict {
                keys: conflicting_keys,
            })
        };

        Ok(BulkInsertResult { inserted, conflict })
    }

    async fn update_names_unordered(
        &self,
        updates: &[NameUpdate],
    ) -> Result<BulkUpdateResult, StoreError> {
        if updates.is_empty() {
            return Ok(BulkUpdateResult::default());
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();
        let mut modified = 0;

        for update in updates {
            let done = sqlx::query(
                r#"
                UPDATE contacts
                SET full_name = ?, updated_at = ?
                WHERE identity_key = ? AND full_name <> ?
                "#,
            )
            .bind(&update.new_full_name)
            .bind(&now)
            .bind(&update.identity_key)
            .bind(&update.new_full_name)
            .execute(&mut *tx)
            .await?;
            modified += done.rows_affected();
        }

        tx.commit().await?;

        Ok(BulkUpdateResult { modified })
    }

    async fn append_run(&self, outcome: &SyncOutcome) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sync_runs (id, total_seen, inserted, updated, skipped, success, error_message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(outcome.id.to_string())
        .bind(to_column(outcome.total_seen))
        .bind(to_column(outcome.inserted))
        .bind(to_column(outcome.updated))
        .bind(to_column(outcome.skipped))
        .bind(outcome.success)
        .bind(&outcome.error_message)
        .bind(outcome.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_column(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
