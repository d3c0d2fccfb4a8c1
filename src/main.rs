use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use academy_landing::config::Config;
use academy_landing::storage::Database;
use academy_landing::{catalog, server};

#[derive(Parser, Debug)]
#[command(
    name = "academy-landing",
    about = "Landing page and newsletter signup for the academy site"
)]
struct Args {
    /// TOML configuration file; missing file means defaults plus environment
    #[arg(long, value_name = "FILE", default_value = "academy.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the landing page (default)
    Serve,
    /// Copy the remote course catalog into the local database
    SyncCatalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::from_file_and_env(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    tracing::debug!(?config, "Configuration loaded");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(config).await.context("Server failed")?,
        Command::SyncCatalog => {
            let remote = server::remote_catalog(&config.catalog)
                .context("Failed to configure the remote catalog")?;
            let db = Database::open(&config.database_url)
                .await
                .with_context(|| format!("Failed to open database {}", config.database_url))?;
            let stored = catalog::sync_to_database(&remote, &db)
                .await
                .context("Catalog sync failed")?;
            println!("Synced {stored} courses into {}", config.database_url);
        }
    }

    Ok(())
}
