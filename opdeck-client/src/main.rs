//! opdeck client entry point
//!
//! Multi-session operator console: several remote shells over one event
//! connection, with a REST side-channel for workspace archiving and helper
//! tools.

use opdeck_utils::{init_logging_with_config, LogConfig, Result};

mod api;
mod cli;
mod config;
mod connection;
mod input;
mod mux;
mod session;
mod snippets;
mod surface;
mod tabs;
mod ui;

use cli::Args;
use config::Config;
use ui::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments before the terminal enters raw mode
    let args = Args::parse_args();

    // Log to file; stderr belongs to the TUI
    init_logging_with_config(LogConfig::client())?;
    tracing::info!("opdeck client starting");
    tracing::debug!("CLI args: {:?}", args);

    match run_app(args).await {
        Ok(()) => {
            tracing::info!("opdeck client exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("opdeck client error: {}", e);
            // Printed after the terminal guard has restored the screen
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let mut config = Config::load();
    if let Some(addr) = args.addr.clone() {
        config.server.addr = addr;
    }
    if let Some(api) = args.api.clone() {
        config.server.api = api;
    }
    if let Some(workspace) = args.workspace {
        config.workspace = Some(workspace);
    }

    let mut app = App::new(config, args.command_string())?;
    app.run().await
}
