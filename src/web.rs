#![cfg(not(tarpaulin_include))]

use clap::Parser;
use std::path::PathBuf;
use taskboard::app;
use taskboard::config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "website", about = "Serve the task tracking web application")]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "TASKBOARD_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long)]
    bind: Option<String>,
}

/// Main entry point for the web application
///
/// Loads the configuration, opens the workbook snapshot it names and serves
/// the screens until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    app::run(config).await
}
