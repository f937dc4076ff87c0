use clap::Args;

use contactsync::store::SqliteContactStore;

use super::{CommandError, OutputFormat};

/// List contacts in the local store
#[derive(Debug, Args)]
pub struct ContactsCommand {
    /// Include contacts marked hidden
    #[arg(long)]
    all: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ContactsCommand {
    pub async fn run(&self, store: &SqliteContactStore) -> Result<(), CommandError> {
        let contacts: Vec<_> = store
            .list_contacts()
            .await?
            .into_iter()
            .filter(|c| self.all || c.visible)
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            }
            OutputFormat::Text => {
                if contacts.is_empty() {
                    println!("No contacts found.");
                    return Ok(());
                }
                for contact in &contacts {
                    println!("{}", contact);
                }
                println!();
                println!(
                    "{} contact{}",
                    contacts.len(),
                    if contacts.len() == 1 { "" } else { "s" }
                );
            }
        }

        Ok(())
    }
}
