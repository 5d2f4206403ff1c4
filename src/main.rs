//! Rover Deck - operator console for a remotely driven rover
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use roverdeck::LaunchOptions;

/// Rover Deck - drive a rover, steer its camera and arm, watch its status
#[derive(Parser, Debug)]
#[command(name = "roverdeck")]
#[command(about = "Operator console for a remotely driven rover", long_about = None)]
struct Args {
    /// Platform host (overrides the configured endpoint for this run)
    #[arg(long)]
    host: Option<String>,

    /// Platform port (overrides the configured endpoint for this run)
    #[arg(long)]
    port: Option<String>,

    /// Persist --host/--port as the configured endpoint
    #[arg(long)]
    save: bool,

    /// Configuration directory (default: platform config dir)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Run in headless mode (NDJSON on stdin/stdout, no TUI)
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    let args = Args::parse();

    if args.save && args.host.is_none() && args.port.is_none() {
        eprintln!("--save needs --host and/or --port");
        std::process::exit(2);
    }

    roverdeck::run(LaunchOptions {
        host: args.host,
        port: args.port,
        save: args.save,
        config_dir: args.config_dir,
        headless: args.headless,
    })
    .await?;
    Ok(())
}
