use clap::{Args, Subcommand};

use contactsync::config::Config;

use super::{CommandError, OutputFormat};

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), CommandError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print_text(config),
                }
                Ok(())
            }
        }
    }
}

fn print_text(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("database_path: {}", config.database_path.value.display());
    println!("  source: {}", config.database_path.source);
    println!();

    println!("interval_secs: {}", config.interval_secs.value);
    println!("  source: {}", config.interval_secs.source);
    println!();

    let source = &config.source;
    println!("source:");
    println!(
        "  server_url:    {}",
        source.server_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  username:      {}",
        source.username.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  password:      {}",
        if source.password.is_some() {
            "********"
        } else {
            "(not set)"
        }
    );
    println!("  address_books: {}", source.address_books.join(", "));
    println!("  timeout_secs:  {}", source.timeout_secs);
}
