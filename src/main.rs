use crate::commands::Command;
use crate::config::{Backend, Config};
use crate::roster::Roster;
use crate::sheets::Sheets;
use crate::store::{CsvStore, MemoryStore, RecordStore, SqlStore};
use clap::Parser;
use eyre::{OptionExt, WrapErr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod availability;
mod checks;
mod commands;
mod config;
mod directory;
mod display;
mod error;
mod model;
mod password;
mod requests;
mod roster;
mod sheets;
mod stats;
mod store;
mod teams;
mod validation;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Use FILE instead of teamroster.toml
    #[arg(short, long, value_name = "FILE", default_value = "teamroster.toml")]
    config: PathBuf,
    /// Do not write back changes
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Set verbosity level
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

async fn execute<S: RecordStore>(
    mut store: S,
    config: &Config,
    command: Command,
    dry_run: bool,
) -> eyre::Result<()> {
    let sheets = Sheets::new(&config.sheets);
    if dry_run {
        let copy = MemoryStore::snapshot(&mut store, &sheets.all())
            .await
            .wrap_err("cannot copy sheets for dry run")?;
        info!("dry run, changes will be discarded");
        commands::run(&mut Roster::new(copy, sheets, config.teams.sizes()), command).await
    } else {
        commands::run(&mut Roster::new(store, sheets, config.teams.sizes()), command).await
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("teamroster={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let config = Config::load(&cli.config)?;
    match config.store.backend {
        Backend::Csv => {
            let store = CsvStore::new(&config.store.path);
            execute(store, &config, cli.command, cli.dry_run).await
        }
        Backend::Sql => {
            let url = config
                .store
                .url
                .as_deref()
                .ok_or_eyre("store.url is required by the sql backend")?;
            let store = SqlStore::new(url)
                .await
                .wrap_err("cannot connect to database")?;
            execute(store, &config, cli.command, cli.dry_run).await
        }
        Backend::Memory => {
            let mut store = MemoryStore::default();
            let sheets = Sheets::new(&config.sheets);
            for sheet in sheets.all() {
                store.ensure_sheet(sheet).await?;
            }
            execute(store, &config, cli.command, cli.dry_run).await
        }
    }
}
