use arbor::cli::{Cli, Commands, PreferencesCommands};
use arbor::commands::Command;
use arbor::commands::conversation::ConversationCommand;
use arbor::commands::preferences::{PreferencesAction, PreferencesCommand};
use arbor_core::TreeContext;
use arbor_core::preferences::Preferences;
use arbor_core::store::JsonFileStore;
use clap::Parser;
use eyre::{Result, eyre};
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize tracing (level configured via RUST_LOG env var)
    arbor_core::utils::tracing::init_tracing()?;

    let preferences = Preferences::load().unwrap_or_default();

    match cli.command {
        Commands::Preferences { action } => {
            let cmd = PreferencesCommand {
                action: match action {
                    PreferencesCommands::Show => PreferencesAction::Show,
                    PreferencesCommands::Path => PreferencesAction::Path,
                    PreferencesCommands::Reset => PreferencesAction::Reset,
                },
            };
            cmd.execute().await
        }
        Commands::Conversation(command) => {
            // --data-dir / ARBOR_DATA_DIR, then preferences, then the platform data dir
            let data_dir = match cli.data_dir {
                Some(dir) => dir,
                None => preferences
                    .conversations_dir()
                    .map_err(|e| eyre!("Failed to resolve conversation directory: {}", e))?,
            };
            debug!(target: "arbor::cli", dir = %data_dir.display(), "Using conversation store");

            let store = JsonFileStore::open(&data_dir)
                .await
                .map_err(|e| eyre!("Failed to open conversation store: {}", e))?;

            let cmd = ConversationCommand {
                command,
                store: Arc::new(store),
                preferences,
                ctx: TreeContext::system(),
            };
            cmd.execute().await
        }
    }
}
