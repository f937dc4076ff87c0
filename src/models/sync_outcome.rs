use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Audit record summarizing one sync run. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub id: Uuid,
    pub total_seen: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SyncOutcome {
    /// Outcome of a run that reconciled `total_seen` unique contacts.
    ///
    /// `skipped` is derived from the other counts and saturates at zero.
    pub fn completed(id: Uuid, total_seen: u64, inserted: u64, updated: u64) -> Self {
        Self {
            id,
            total_seen,
            inserted,
            updated,
            skipped: total_seen.saturating_sub(inserted + updated),
            success: true,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Outcome of a run that failed after parsing began. Counts are zeroed.
    pub fn failed(id: Uuid, error_message: impl Into<String>) -> Self {
        Self {
            id,
            total_seen: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            success: false,
            error_message: Some(error_message.into()),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(
            f,
            "{} {:<6} seen={} inserted={} updated={} skipped={}",
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            status,
            self.total_seen,
            self.inserted,
            self.updated,
            self.skipped
        )?;
        if let Some(msg) = &self.error_message {
            write!(f, " error=\"{}\"", msg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_derives_skipped() {
        let outcome = SyncOutcome::completed(Uuid::new_v4(), 10, 3, 2);
        assert!(outcome.success);
        assert_eq!(outcome.skipped, 5);
        assert_eq!(
            outcome.inserted + outcome.updated + outcome.skipped,
            outcome.total_seen
        );
        assert!(outcome.error_message.is_none());
    }

    #[test]
    fn test_completed_skipped_never_negative() {
        let outcome = SyncOutcome::completed(Uuid::new_v4(), 1, 2, 0);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_failed_zeroes_counts() {
        let outcome = SyncOutcome::failed(Uuid::new_v4(), "database is locked");
        assert!(!outcome.success);
        assert_eq!(outcome.total_seen, 0);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.error_message.as_deref(), Some("database is locked"));
    }

    #[test]
    fn test_display_includes_error() {
        let outcome = SyncOutcome::failed(Uuid::new_v4(), "boom");
        let output = format!("{}", outcome);
        assert!(output.contains("failed"));
        assert!(output.contains("error=\"boom\""));
    }
}
