use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use clap::Parser;

mod app;
mod config;
mod event;
mod tui;
mod widgets;

use app::App;
use config::Config;

/// Track catalogs of Earth-orbiting objects in the terminal.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path of the configuration file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Permalink query restoring a group and selection, e.g. `group=SMD&satellite=25544`.
    #[arg(long)]
    permalink: Option<String>,
    /// Catalog group to load.
    #[arg(long)]
    group: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger()?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };
    App::with_config(config, cli.group, cli.permalink)?.run().await
}

/// Logs to a file, the terminal belongs to the interface.
fn init_logger() -> Result<()> {
    let path = std::env::temp_dir().join("orbit-tracker.log");
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn default_config() -> Result<Config> {
    let Some(path) = std::env::home_dir().map(|home| home.join(".config/orbit-tracker/config.toml"))
    else {
        return Ok(Config::default());
    };
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config(&path)
}

fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config file {}", path.display()))?;
    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}
