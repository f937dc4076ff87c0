//! Commands that perform sync runs.

use clap::Args;
use std::time::Duration;

use contactsync::config::Config;
use contactsync::source::CardDavSource;
use contactsync::store::SqliteContactStore;
use contactsync::sync::{run_periodic, shutdown_signal, RunReport, SyncOrchestrator};

use super::{CommandError, OutputFormat};

/// Run a single sync against the remote address book
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl SyncCommand {
    pub async fn run(
        &self,
        store: &SqliteContactStore,
        config: &Config,
    ) -> Result<(), CommandError> {
        let source = CardDavSource::from_config(&config.source)?;
        let orchestrator =
            SyncOrchestrator::new(source, store.clone()).with_run_lock(config.run_lock_path());

        let report = orchestrator.run().await;

        match self.format {
            OutputFormat::Text => print_report(&report),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report_json(&report))?)
            }
        }

        match report.error {
            Some(e) => Err(CommandError::RunFailed(e)),
            None => Ok(()),
        }
    }
}

/// Run syncs periodically until interrupted
#[derive(Debug, Args)]
pub struct DaemonCommand {
    /// Seconds between runs (overrides interval_secs from config)
    #[arg(long)]
    interval: Option<u64>,
}

impl DaemonCommand {
    pub async fn run(
        &self,
        store: &SqliteContactStore,
        config: &Config,
    ) -> Result<(), CommandError> {
        let source = CardDavSource::from_config(&config.source)?;
        let orchestrator =
            SyncOrchestrator::new(source, store.clone()).with_run_lock(config.run_lock_path());

        let secs = self
            .interval
            .filter(|secs| *secs > 0)
            .unwrap_or(config.interval_secs.value);

        let runs = run_periodic(&orchestrator, Duration::from_secs(secs), shutdown_signal()).await;
        tracing::info!("Daemon stopped after {} run(s)", runs);

        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let status = if report.is_success() {
        "✓ Sync completed"
    } else {
        "✗ Sync failed"
    };
    println!("{} in {}ms", status, report.duration.as_millis());
    println!();

    let stats = &report.stats;
    println!("  Address books: {}", stats.containers);
    println!(
        "  Records:       {} ({} parsed, {} duplicate{})",
        stats.raw_records,
        stats.parsed,
        stats.duplicates_dropped,
        if stats.duplicates_dropped == 1 { "" } else { "s" }
    );

    if let Some(outcome) = report.outcome.as_ref().filter(|o| o.success) {
        println!("  Inserted:      {}", outcome.inserted);
        println!("  Updated:       {}", outcome.updated);
        println!("  Unchanged:     {}", outcome.skipped);
        if stats.conflicts > 0 {
            println!("  Conflicts:     {}", stats.conflicts);
        }
    }

    if let Some(phase) = report.failed_in {
        println!("  Failed while:  {}", phase);
    }
    if let Some(e) = &report.audit_error {
        println!();
        println!("Warning: run record could not be saved: {}", e);
    }
}

fn report_json(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "run_id": report.run_id,
        "success": report.is_success(),
        "duration_ms": report.duration.as_millis() as u64,
        "failed_in": report.failed_in.map(|p| p.to_string()),
        "error": report.error.as_ref().map(|e| e.to_string()),
        "audit_error": report.audit_error.as_ref().map(|e| e.to_string()),
        "records": {
            "containers": report.stats.containers,
            "raw": report.stats.raw_records,
            "parsed": report.stats.parsed,
            "duplicates": report.stats.duplicates_dropped,
            "unique": report.stats.unique,
            "conflicts": report.stats.conflicts,
        },
        "outcome": report.outcome,
    })
}
