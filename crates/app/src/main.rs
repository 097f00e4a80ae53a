mod args;
mod commands;

use services::{AppServices, Clock, ContentSourceConfig, LoaderConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, prepare_sqlite_file, print_usage};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("app=info,services=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            print_usage();
            return Err(e.into());
        }
    };

    let content = match parsed.content.as_deref() {
        Some(raw) => ContentSourceConfig::parse(raw)?,
        None => ContentSourceConfig::from_env()?,
    };
    let mut config = LoaderConfig::from_env();
    if let Command::Pages {
        strategy: Some(strategy),
        ..
    } = &parsed.command
    {
        config = config.with_strategy(*strategy);
    }
    debug!(db = %parsed.db_url, ?content, ?config, "starting");

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, &content, config, Clock::system()).await?;

    commands::execute(&services, parsed.command).await
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
