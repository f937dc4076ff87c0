//! Periodic triggering of sync runs for daemon mode.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};

use super::orchestrator::SyncOrchestrator;
use crate::source::ContactSource;
use crate::store::ContactStore;

/// Runs `orchestrator` every `period` until `shutdown` resolves.
///
/// The first run starts immediately. Each run is awaited before the next
/// tick, and ticks missed while a run was in progress are skipped, so runs
/// never overlap. A failed or panicking run is logged and the loop keeps
/// going. Shutdown is only observed between runs.
///
/// Returns the number of runs started.
pub async fn run_periodic<S, T, F>(
    orchestrator: &SyncOrchestrator<S, T>,
    period: Duration,
    shutdown: F,
) -> usize
where
    S: ContactSource,
    T: ContactStore,
    F: Future<Output = ()>,
{
    tracing::info!("Scheduler started, running every {:?}", period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut runs = 0;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, stopping scheduler");
                break;
            }
            _ = ticker.tick() => {
                runs += 1;
                match AssertUnwindSafe(orchestrator.run()).catch_unwind().await {
                    Ok(report) if !report.is_success() => {
                        tracing::debug!("Run {} failed, retrying on next tick", report.run_id);
                    }
                    Ok(_) => {}
                    Err(_) => {
                        tracing::error!("Sync run panicked, retrying on next tick");
                    }
                }
            }
        }
    }

    runs
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
