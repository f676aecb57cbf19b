use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pesofolio::core::currency::CurrencyCode;
use pesofolio::core::log::init_logging;
use tracing::level_filters::LevelFilter;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the dashboard API server
    Serve,
    /// Display current ARS/USD exchange rates
    Rates,
    /// Convert an amount between ARS, USD, USD_OFICIAL, USD_CCL and USD_BLUE
    Convert {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        from: String,
        to: String,
    },
}

impl From<Commands> for pesofolio::AppCommand {
    fn from(cmd: Commands) -> pesofolio::AppCommand {
        match cmd {
            Commands::Serve => pesofolio::AppCommand::Serve,
            Commands::Rates => pesofolio::AppCommand::Rates,
            Commands::Convert { amount, from, to } => pesofolio::AppCommand::Convert {
                amount,
                from: CurrencyCode::from(from),
                to: CurrencyCode::from(to),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => pesofolio::cli::setup::setup(),
        Some(cmd) => pesofolio::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
