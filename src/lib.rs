pub mod cli;
pub mod converter;
pub mod core;
pub mod format;
pub mod providers;
pub mod store;

use crate::converter::CurrencyConverter;
use crate::core::config::AppConfig;
use crate::core::currency::Currency;
use crate::store::{KeyValueStore, RateStorage};
use anyhow::Result;
use tracing::{debug, info, warn};

pub use converter::CacheInfo;

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Rates,
    Refresh {
        base: Currency,
    },
    Clear,
    Convert {
        amount: f64,
        from: String,
        to: String,
        remote: bool,
    },
    Price {
        amount: f64,
        currency: String,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxrate starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = open_store(&config);
    let storage = RateStorage::from_store(&store)?;
    let converter = CurrencyConverter::from_config(&config, storage)?;

    match command {
        AppCommand::Rates => cli::rates::run(&converter).await,
        AppCommand::Refresh { base } => cli::rates::refresh(&converter, base).await,
        AppCommand::Clear => cli::rates::clear(&converter),
        AppCommand::Convert {
            amount,
            from,
            to,
            remote: false,
        } => cli::convert::run(&converter, amount, &from, &to).await,
        AppCommand::Convert {
            amount,
            from,
            to,
            remote: true,
        } => cli::convert::run_remote(&converter, amount, &from, &to).await,
        AppCommand::Price { amount, currency } => {
            cli::convert::price(&converter, amount, &currency).await
        }
    }
}

/// Falls back to an in-memory store when the data directory cannot be opened.
fn open_store(config: &AppConfig) -> KeyValueStore {
    let opened = config
        .default_data_path()
        .and_then(|path| KeyValueStore::open(&path));
    match opened {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "Persistent store unavailable, rates will not survive restarts");
            KeyValueStore::in_memory()
        }
    }
}
