use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use wondash::core::log::init_logging;

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

impl From<Commands> for wondash::AppCommand {
    fn from(cmd: Commands) -> wondash::AppCommand {
        match cmd {
            Commands::Serve { port } => wondash::AppCommand::Serve { port },
            Commands::Rate => wondash::AppCommand::Rate,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard HTTP API
    Serve {
        /// Port to bind, overriding the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create default configuration
    Setup,
    /// Print the current USD/KRW rate and exit
    Rate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => wondash::cli::setup::setup(),
        Some(cmd) => wondash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
