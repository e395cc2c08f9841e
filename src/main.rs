// src/main.rs

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sdiary::cli::{Cli, Commands};
use sdiary::commands;
use sdiary::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if std::path::Path::new(&cli.dotenv).exists() {
        dotenvy::from_path(&cli.dotenv)?;
        eprintln!("Loaded environment from {}", cli.dotenv);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db_path = commands::resolve_db_path(cli.db)?;

    match cli.command {
        Commands::Init => commands::handle_init(db_path)?,
        Commands::Serve { bind } => {
            let config = Config::from_env(db_path)?;
            commands::handle_serve(config, bind).await?;
        }
        Commands::List { num } => commands::handle_list(&Config::from_env(db_path)?, num)?,
        Commands::Link { id } => commands::handle_link(&Config::from_env(db_path)?, id)?,
    }

    Ok(())
}
