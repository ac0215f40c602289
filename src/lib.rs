pub mod api;
pub mod cli;
pub mod core;
pub mod providers;

use anyhow::Result;
use std::path::Path;

/// Commands the binary dispatches once logging and config are in place.
pub enum AppCommand {
    Serve { port: Option<u16> },
    Rate,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = core::config::AppConfig::load(config_path.map(Path::new))?;
    tracing::debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve { port } => cli::serve::serve(&config, port).await,
        AppCommand::Rate => cli::rate::rate(&config).await,
    }
}
