use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    CommandError, ConfigCommand, ContactsCommand, DaemonCommand, HistoryCommand, SyncCommand,
};
use contactsync::config::Config;
use contactsync::store::SqliteContactStore;

#[derive(Parser)]
#[command(name = "contactsync")]
#[command(version)]
#[command(about = "Mirror a remote address book into a local contact store", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommands),

    /// Manage configuration
    Config(ConfigCommand),
}

/// Commands that need an open contact store
#[derive(Subcommand)]
enum StoreCommands {
    /// Run one sync now
    Sync(SyncCommand),

    /// Run syncs periodically until interrupted
    Daemon(DaemonCommand),

    /// Show recent sync runs
    History(HistoryCommand),

    /// List stored contacts
    Contacts(ContactsCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        Some(Commands::Store(command)) => {
            let store = SqliteContactStore::connect(&config.database_path.value).await?;
            let result = execute_command(command, &store, &config).await;
            store.close().await;
            result?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn execute_command(
    command: StoreCommands,
    store: &SqliteContactStore,
    config: &Config,
) -> Result<(), CommandError> {
    match command {
        StoreCommands::Sync(cmd) => cmd.run(store, config).await,
        StoreCommands::Daemon(cmd) => cmd.run(store, config).await,
        StoreCommands::History(cmd) => cmd.run(store).await,
        StoreCommands::Contacts(cmd) => cmd.run(store).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "contactsync=debug"
    } else {
        "contactsync=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
