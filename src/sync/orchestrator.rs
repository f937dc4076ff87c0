//! Sequencing of a single sync run.
//!
//! A run moves through `Fetching -> Parsing -> Planning -> Executing` and
//! ends `Completed` or `Failed`. Exactly one [`SyncOutcome`] is appended
//! to the store for every run that reaches `Parsing`; a run that fails
//! while fetching leaves no audit record.
//!
//! With [`SyncOrchestrator::with_run_lock`] a run also holds an exclusive
//! [`RunLock`] for its whole duration, so separate processes sharing one
//! store take turns.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::models::{Contact, SyncOutcome};
use crate::reconcile::{dedupe, execute, parse, plan, ExecutionSummary};
use crate::source::{ContactSource, RawRecord, SourceError};
use crate::store::{ContactStore, StoreError};

use super::lock::{LockError, RunLock};

const LOCK_POLL: Duration = Duration::from_millis(250);

/// Phase of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Parsing,
    Planning,
    Executing,
    Completed,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Fetching => write!(f, "fetching"),
            RunPhase::Parsing => write!(f, "parsing"),
            RunPhase::Planning => write!(f, "planning"),
            RunPhase::Executing => write!(f, "executing"),
            RunPhase::Completed => write!(f, "completed"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Primary failure of a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Counts gathered along the way, for logging and the CLI summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub containers: usize,
    pub raw_records: usize,
    pub parsed: usize,
    pub duplicates_dropped: usize,
    pub unique: usize,
    pub conflicts: usize,
}

/// Everything known about a finished run.
///
/// `error` is the primary failure. `audit_error` is set when writing the
/// audit record itself failed; it never replaces `error`.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    /// `Completed` or `Failed`.
    pub phase: RunPhase,
    /// Phase the run was in when it failed.
    pub failed_in: Option<RunPhase>,
    pub stats: RunStats,
    /// The audit record written (or attempted) for this run.
    pub outcome: Option<SyncOutcome>,
    pub error: Option<SyncError>,
    pub audit_error: Option<StoreError>,
    pub duration: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Completed
    }
}

/// Runs reconciliation between a [`ContactSource`] and a [`ContactStore`].
///
/// Runs are serialized: [`SyncOrchestrator::run`] waits for any active run
/// to finish, [`SyncOrchestrator::try_run`] skips instead.
pub struct SyncOrchestrator<S, T> {
    source: S,
    store: T,
    run_guard: Mutex<()>,
    lock_path: Option<PathBuf>,
}

impl<S: ContactSource, T: ContactStore> SyncOrchestrator<S, T> {
    pub fn new(source: S, store: T) -> Self {
        Self {
            source,
            store,
            run_guard: Mutex::new(()),
            lock_path: None,
        }
    }

    /// Also serializes runs against other processes through a lock file.
    pub fn with_run_lock(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    /// Performs one run, waiting for a run already in progress to finish.
    pub async fn run(&self) -> RunReport {
        let _guard = self.run_guard.lock().await;
        let _lock = match &self.lock_path {
            Some(path) => match RunLock::acquire(path, LOCK_POLL).await {
                Ok(lock) => Some(lock),
                Err(e) => return lock_failure(e),
            },
            None => None,
        };
        self.run_exclusive().await
    }

    /// Performs one run unless another is in progress, in which case it
    /// returns `None`.
    pub async fn try_run(&self) -> Option<RunReport> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            tracing::warn!("Sync run already in progress, skipping");
            return None;
        };
        let _lock = match &self.lock_path {
            Some(path) => match RunLock::try_acquire(path) {
                Ok(Some(lock)) => Some(lock),
                Ok(None) => {
                    tracing::warn!("Sync run in progress in another process, skipping");
                    return None;
                }
                Err(e) => return Some(lock_failure(e)),
            },
            None => None,
        };
        Some(self.run_exclusive().await)
    }

    async fn run_exclusive(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sync_run", %run_id);
        self.run_phases(run_id).instrument(span).await
    }

    async fn run_phases(&self, run_id: Uuid) -> RunReport {
        let started = Instant::now();
        let mut stats = RunStats::default();
        let mut phase = RunPhase::Idle;

        enter(&mut phase, RunPhase::Fetching);
        let records = match self.fetch_all(&mut stats).await {
            Ok(records) => records,
            Err(e) => {
                let duration = started.elapsed();
                tracing::error!(
                    "Sync run failed while fetching after {}ms, no run record written: {}",
                    duration.as_millis(),
                    e
                );
                return RunReport {
                    run_id,
                    phase: RunPhase::Failed,
                    failed_in: Some(RunPhase::Fetching),
                    stats,
                    outcome: None,
                    error: Some(SyncError::Fetch(e)),
                    audit_error: None,
                    duration,
                };
            }
        };

        enter(&mut phase, RunPhase::Parsing);
        let contacts: Vec<Contact> = records.iter().filter_map(|r| parse(r.as_str())).collect();
        stats.parsed = contacts.len();
        let deduped = dedupe(contacts);
        stats.duplicates_dropped = deduped.dropped;
        stats.unique = deduped.unique.len();
        tracing::debug!(
            "Parsed {} of {} record(s), dropped {} duplicate(s)",
            stats.parsed,
            stats.raw_records,
            stats.duplicates_dropped
        );

        let (outcome, error, failed_in) = match self.reconcile(&deduped.unique, &mut phase).await {
            Ok(summary) => {
                stats.conflicts = summary.conflicts.len();
                if !summary.conflicts.is_empty() {
                    tracing::warn!(
                        "{} insert(s) collided with existing contacts: {}",
                        summary.conflicts.len(),
                        summary.conflicts.join(", ")
                    );
                }
                let outcome = SyncOutcome::completed(
                    run_id,
                    stats.unique as u64,
                    summary.inserted,
                    summary.updated,
                );
                (outcome, None, None)
            }
            Err(e) => {
                let outcome = SyncOutcome::failed(run_id, e.to_string());
                (outcome, Some(SyncError::Store(e)), Some(phase))
            }
        };

        let audit_error = match self.store.append_run(&outcome).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to record sync run: {}", e);
                Some(e)
            }
        };

        let duration = started.elapsed();
        match &error {
            None => {
                enter(&mut phase, RunPhase::Completed);
                tracing::info!(
                    "Sync run completed in {}ms: seen={} inserted={} updated={} skipped={} duplicates={}",
                    duration.as_millis(),
                    outcome.total_seen,
                    outcome.inserted,
                    outcome.updated,
                    outcome.skipped,
                    stats.duplicates_dropped
                );
            }
            Some(e) => {
                enter(&mut phase, RunPhase::Failed);
                tracing::error!("Sync run failed after {}ms: {}", duration.as_millis(), e);
            }
        }

        RunReport {
            run_id,
            phase,
            failed_in,
            stats,
            outcome: Some(outcome),
            error,
            audit_error,
            duration,
        }
    }

    async fn fetch_all(&self, stats: &mut RunStats) -> Result<Vec<RawRecord>, SourceError> {
        let containers = self.source.list_containers().await?;
        stats.containers = containers.len();

        let mut records = Vec::new();
        for container in &containers {
            let batch = self.source.list_records(container).await?;
            tracing::debug!("Address book '{}': {} record(s)", container, batch.len());
            records.extend(batch);
        }
        stats.raw_records = records.len();
        Ok(records)
    }

    async fn reconcile(
        &self,
        unique: &[Contact],
        phase: &mut RunPhase,
    ) -> Result<ExecutionSummary, StoreError> {
        enter(phase, RunPhase::Planning);
        let existing = self.store.load_identities().await?;
        let write_plan = plan(unique, &existing);
        tracing::debug!(
            "Planned {} insert(s), {} update(s), {} unchanged",
            write_plan.inserts.len(),
            write_plan.updates.len(),
            write_plan.unchanged
        );

        enter(phase, RunPhase::Executing);
        execute(&self.store, &write_plan).await
    }
}

/// Report for a run that never started because the lock file was unusable.
fn lock_failure(e: LockError) -> RunReport {
    tracing::error!("Sync run not started: {}", e);
    RunReport {
        run_id: Uuid::new_v4(),
        phase: RunPhase::Failed,
        failed_in: Some(RunPhase::Idle),
        stats: RunStats::default(),
        outcome: None,
        error: Some(SyncError::Lock(e)),
        audit_error: None,
        duration: Duration::ZERO,
    }
}

fn enter(phase: &mut RunPhase, next: RunPhase) {
    tracing::debug!("{} -> {}", phase, next);
    *phase = next;
}
