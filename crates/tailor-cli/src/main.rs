use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::io::IsTerminal;
use std::sync::Arc;
use tailor_core::profiles::{ConfiguredIdentity, ConfiguredScopeProvider};
use tailor_core::remote::HttpListingClient;
use tailor_core::services::{KeyValueStore, NoOpStatusListener, ScopeProvider};
use tailor_core::storage::JsonFileStore;
use tailor_core::terminal::{render_item, TerminalNotifier, TerminalPrompt};
use tailor_core::{
    Collaborators, ConfigLoader, CustomizationCoordinator, ScopeChangeEvent, ScopeChangeReason,
    SessionContext,
};

#[derive(Parser, Debug)]
#[clap(name = "tailor", author, version = "0.1.0", about = "Select the customization code suggestions come from")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "tailor.yaml", help = "Configuration file")]
    config: String,

    #[clap(long, short, help = "Log level (defaults to logging.level from the config)")]
    log_level: Option<String>,

    #[clap(long, help = "Never prompt; notifications are printed without actions")]
    non_interactive: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-list customizations and report new or vanished ones
    Refresh,
    /// Pick a customization interactively
    Select,
    /// Print the picker rows without prompting
    List,
    /// Show the current selection
    Show,
    /// Change the active profile and re-validate the selection
    SwitchProfile {
        /// Profile identifier or name
        profile: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::from_file(&cli.config).await?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_level_filter = level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let state_file = config.storage.resolved_state_file();
    log::debug!("Using state file {}", state_file.display());
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&state_file).await?);

    let scopes = Arc::new(
        ConfiguredScopeProvider::new(&config.profiles)
            .with_store(store.clone())
            .await,
    );
    let interactive = !cli.non_interactive && std::io::stdin().is_terminal();

    let coordinator = CustomizationCoordinator::new(
        Collaborators {
            listing: Arc::new(HttpListingClient::from_config(&config.service)?),
            scopes: scopes.clone(),
            identity: Arc::new(ConfiguredIdentity::new(&config.identity)),
            store,
            prompt: Arc::new(TerminalPrompt),
            notifications: Arc::new(TerminalNotifier::new(interactive)),
            status: Arc::new(NoOpStatusListener),
        },
        SessionContext::new().with_override(config.override_customization.clone()),
        config.learn_more_url.clone(),
    );

    match cli.command {
        Commands::Refresh => {
            coordinator.refresh_and_notify_if_new().await;
        }
        Commands::Select => {
            if !interactive {
                return Err(anyhow!("'select' needs an interactive terminal; use 'list' instead"));
            }
            coordinator.prompt_for_selection().await;
        }
        Commands::List => {
            for item in coordinator.build_picker_items().await {
                println!("{}", render_item(&item));
            }
        }
        Commands::Show => {
            let selected = coordinator.get_selected().await;
            if selected.is_base() {
                println!("Customization: {} (default)", selected.name);
            } else {
                println!("Customization: {} ({})", selected.name, selected.identifier);
            }
            match scopes.active_scope().await {
                Some(scope) => println!("Profile: {} ({})", scope.name, scope.identifier),
                None => println!("Profile: none"),
            }
            let new_count = coordinator.new_customizations_count().await;
            if new_count > 0 {
                println!("New customizations available: {}", new_count);
            }
        }
        Commands::SwitchProfile { profile } => {
            let scope = scopes
                .find(&profile)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown profile '{}'", profile))?;
            scopes.switch_scope(&scope, ScopeChangeReason::User).await?;
            coordinator
                .on_scope_changed(ScopeChangeEvent::new(Some(scope.clone()), ScopeChangeReason::User))
                .await;
            println!("Active profile: {}", scope.name);
        }
    }

    Ok(())
}
