use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use repscope::{
    db::open,
    store::SqliteStore,
    types::{Config, OutputFmt},
};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let fmt = OutputFmt::from_flag(cli.json);
    let config_path = Config::default_path()?;

    match cli.cmd {
        // Config commands never open the database.
        Commands::Config(cmd) => commands::config::handle(cmd, &config_path)?,
        cmd => run(cmd, &config_path, fmt).await?,
    }

    Ok(())
}

async fn run(cmd: Commands, config_path: &Path, fmt: OutputFmt) -> Result<()> {
    let cfg = Config::load(config_path)?;
    let db_path = cfg.db_path()?;
    log::debug!("using database {}", db_path.display());

    let store = SqliteStore::new(open(&db_path).await?);

    match cmd {
        Commands::Exercise(cmd) => commands::exercise::handle(cmd, &store, fmt).await,
        Commands::Session(cmd) => commands::session::handle(cmd, &store, fmt).await,
        Commands::Analyze(args) => commands::analyze::handle(args, &store, &cfg, fmt).await,
        Commands::Goal(cmd) => commands::goal::handle(cmd, &store, fmt).await,
        Commands::Config(cmd) => commands::config::handle(cmd, config_path),
    }
}
