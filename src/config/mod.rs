pub mod settings;

pub use settings::Settings;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "cellar-sync")]
#[command(about = "Business-day windows and POS sales sync for hospitality inventory")]
pub struct CliConfig {
    /// Path to the settings file
    #[arg(long, default_value = "cellar-sync.toml")]
    pub config: String,

    /// Directory for the local claim state file
    #[arg(long, default_value = "./state")]
    pub state_dir: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync the currently open business day for a location
    Sync {
        #[arg(long)]
        location: String,
        /// POS provider; defaults to the location's configured provider
        #[arg(long)]
        provider: Option<String>,
    },
    /// Print the alert summary for a location
    Summary {
        #[arg(long)]
        location: String,
    },
    /// Print the business-day window for a location and date
    Window {
        #[arg(long)]
        location: String,
        /// Calendar label (YYYY-MM-DD); defaults to the currently open day
        #[arg(long)]
        date: Option<String>,
    },
}
