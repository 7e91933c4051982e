#![allow(clippy::print_stdout)]

use anyhow::Context;
use campus::domain::config::AppConfig;
use campus::kernel::config::load_config;
use campus_cli::args::Cli;
use campus_cli::{App, Fixture};
use campus_logger::Logger;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: AppConfig = match &cli.config {
        Some(path) => load_config(Some(path)).context("Critical: Configuration is malformed")?,
        None => AppConfig::default(),
    };

    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &config.logging)?;

    let app = App::new(config)?;
    if let Some(path) = &cli.fixture {
        app.seed(&Fixture::from_path(path)?).await?;
    }

    let report = app.execute(&cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
