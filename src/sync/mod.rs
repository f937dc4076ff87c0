//! Sync runs: one-shot orchestration and periodic scheduling.
//!
//! # Usage
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use contactsync::config::Config;
//! use contactsync::source::CardDavSource;
//! use contactsync::store::SqliteContactStore;
//! use contactsync::sync::SyncOrchestrator;
//!
//! let config = Config::load(None)?;
//! let store = SqliteContactStore::connect(&config.database_path.value).await?;
//! let source = CardDavSource::from_config(&config.source)?;
//!
//! let orchestrator = SyncOrchestrator::new(source, store.clone());
//! let report = orchestrator.run().await;
//! println!("success: {}", report.is_success());
//!
//! store.close().await;
//! # Ok(())
//! # }
//! ```

mod lock;
mod orchestrator;
mod scheduler;

pub use lock::{LockError, RunLock};
pub use orchestrator::{RunPhase, RunReport, RunStats, SyncError, SyncOrchestrator};
pub use scheduler::{run_periodic, shutdown_signal};
