mod config_cmd;
mod contacts_cmd;
mod history_cmd;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use contacts_cmd::ContactsCommand;
pub use history_cmd::HistoryCommand;
pub use sync_cmd::{DaemonCommand, SyncCommand};

use clap::ValueEnum;
use thiserror::Error;

use contactsync::source::SourceError;
use contactsync::store::StoreError;
use contactsync::sync::SyncError;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Sync run failed: {0}")]
    RunFailed(SyncError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
