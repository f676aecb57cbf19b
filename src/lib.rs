pub mod analysis;
pub mod cli;
pub mod core;
pub mod providers;
pub mod rates;
pub mod server;

use crate::core::config::AppConfig;
use crate::core::currency::CurrencyCode;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Rates,
    Convert {
        amount: f64,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("pesofolio starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Serve => server::serve(&config).await,
        AppCommand::Rates => {
            let state = server::build_state(&config);
            cli::rates::run(&state.rates).await;
            Ok(())
        }
        AppCommand::Convert { amount, from, to } => {
            let state = server::build_state(&config);
            cli::rates::run_convert(&state.rates, amount, &from, &to).await;
            Ok(())
        }
    }
}
