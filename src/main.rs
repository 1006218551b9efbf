use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxrate::core::currency::Currency;
use fxrate::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxrate::AppCommand {
    fn from(cmd: Commands) -> fxrate::AppCommand {
        match cmd {
            Commands::Rates => fxrate::AppCommand::Rates,
            Commands::Refresh { base } => fxrate::AppCommand::Refresh { base },
            Commands::Clear => fxrate::AppCommand::Clear,
            Commands::Convert {
                amount,
                from,
                to,
                remote,
            } => fxrate::AppCommand::Convert {
                amount,
                from,
                to,
                remote,
            },
            Commands::Price { amount, currency } => fxrate::AppCommand::Price { amount, currency },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show current exchange rates and cache state
    Rates,
    /// Drop cached rates and fetch new ones
    Refresh {
        /// Pivot currency to request rates against
        #[arg(short, long, default_value = "USD")]
        base: Currency,
    },
    /// Remove cached rates from memory and disk
    Clear,
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Ask the backend to convert instead of using local rates
        #[arg(long)]
        remote: bool,
    },
    /// Show a price in every supported currency
    Price { amount: f64, currency: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxrate::cli::setup::setup(),
        Some(cmd) => fxrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
