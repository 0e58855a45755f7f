mod cli;
mod config;
mod document;
mod storage;

use std::{fs, path::Path};

use clap::Parser;
use color_eyre::Result;
use sealsave_store::SaveSystem;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    cli::{Command, ConfigCommand, KeysCommand},
    document::Document,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        Command::Version => print_version(),
        Command::Health => run_health_check(&config).await?,
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Keys(cmd) => run_keys(cmd, &config)?,
        Command::Formats => {
            let system = storage::save_system_from_config(&config)?;
            for format in system.registry().formats() {
                let marker = if format == system.default_format() {
                    " (default)"
                } else {
                    ""
                };
                println!("{format}{marker}");
            }
        }
        Command::Save {
            name,
            input,
            format,
        } => {
            let system = ready_system(&config)?;
            save_document(&system, &name, &input, format.as_deref()).await?;
            println!("Saved {}", system.path_for(&name)?.display());
        }
        Command::Show { name, format } => {
            let system = ready_system(&config)?;
            println!("{}", system.load_to_string(&name, format.as_deref())?);
        }
    }

    Ok(())
}

fn init_tracing() {
    // SEALSAVE_LOG wins over RUST_LOG; logs go to stderr so `show` output stays pipeable.
    let env_filter = EnvFilter::try_from_env("SEALSAVE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("sealsave {}", env!("CARGO_PKG_VERSION"));
}

fn ready_system(config: &config::Config) -> Result<SaveSystem> {
    let system = storage::save_system_from_config(config)?;
    system.keys().initialize(None)?;
    Ok(system)
}

fn run_keys(cmd: KeysCommand, config: &config::Config) -> Result<()> {
    match cmd {
        KeysCommand::Init => {
            ready_system(config)?;
            println!("Encryption key ready.");
        }
        KeysCommand::Reset => {
            let system = storage::save_system_from_config(config)?;
            system.keys().reset_keys()?;
            println!("Encryption key deleted; a new one is generated on next use.");
        }
        KeysCommand::Status => {
            let store = storage::key_store_from_config(config)?;
            let state = if store.load_key().is_some() {
                "present"
            } else {
                "missing"
            };
            println!("Key store `{}`: {state}", store.name());
        }
    }
    Ok(())
}

async fn save_document(
    system: &SaveSystem,
    name: &str,
    input: &Path,
    format: Option<&str>,
) -> Result<()> {
    let contents = fs::read_to_string(input)?;
    let fields: Value = serde_json::from_str(&contents)?;
    let document = Document::from_value(name, fields)?;
    system.save_async(&document, name, format).await?;
    Ok(())
}

/// Runs a quick encrypted round trip through the save directory.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let system = ready_system(config)?;
    run_save_health(&system).await?;
    println!("Storage: ok");
    Ok(())
}

async fn run_save_health(system: &SaveSystem) -> Result<()> {
    let probe_name = "health_probe";
    let probe = Document::probe(probe_name);
    system.save_async(&probe, probe_name, None).await?;

    let mut round_trip = Document::empty(probe_name);
    let loaded = system.load_async(&mut round_trip, probe_name, None).await;
    let path = system.path_for(probe_name)?;
    if let Err(err) = fs::remove_file(&path) {
        tracing::warn!("failed to remove health probe {}: {err}", path.display());
    }
    loaded?;

    if round_trip.fields() != probe.fields() {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
