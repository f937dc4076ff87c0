use clap::Args;

use contactsync::store::SqliteContactStore;

use super::{CommandError, OutputFormat};

/// Show recent sync runs
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Number of runs to show
    #[arg(long, short = 'n', default_value_t = 20)]
    limit: u32,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl HistoryCommand {
    pub async fn run(&self, store: &SqliteContactStore) -> Result<(), CommandError> {
        let runs = store.list_runs(self.limit).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&runs)?);
            }
            OutputFormat::Text => {
                if runs.is_empty() {
                    println!("No sync runs recorded yet.");
                    return Ok(());
                }
                for run in &runs {
                    println!("{}", run);
                }
            }
        }

        Ok(())
    }
}
