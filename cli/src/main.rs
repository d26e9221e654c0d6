use std::path::PathBuf;

use clap::{Parser, Subcommand};
use screenvault_storage::{
    BackendError, ConfigError, FileBackend, NamespacedStore, PartitionId, StoreConfig, StoreError, ThemePreference,
};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot open storage file: {0}")]
    Open(#[from] BackendError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "vault", about = "Inspect and edit ScreenVault namespaced storage")]
struct Cli {
    /// JSON file standing in for the browser's flat key/value store.
    #[arg(long, env = "VAULT_PATH", default_value = "screenvault-storage.json")]
    path: PathBuf,

    /// Act as this user; omit for the anonymous partition.
    #[arg(long, env = "VAULT_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value for a key in the active partition.
    Get {
        key: String,
        /// JSON printed when the key is absent.
        #[arg(long, default_value = "null")]
        default: String,
    },
    /// Store a value; text that is not JSON is stored as a string.
    Set { key: String, value: String },
    /// Delete a key from the active partition.
    Remove { key: String },
    /// Print the whole namespaced document.
    Dump,
    /// List partitions and how many values each holds.
    Partitions,
    /// Run the theme and legacy key migrations for the active partition.
    Migrate,
    /// Show the active theme, or set it.
    Theme { name: Option<String> },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::from_env()?;
    let backend = FileBackend::open(&cli.path)?;
    let store = NamespacedStore::new(backend, config, cli.user.as_deref());
    tracing::debug!(path = %cli.path.display(), partition = %store.current_partition(), "storage opened");

    match cli.command {
        Command::Get { key, default } => {
            let default: Value = serde_json::from_str(&default)?;
            print_json(&store.get(&key, default))
        }
        Command::Set { key, value } => {
            store.set(&key, parse_value(&value))?;
            Ok(())
        }
        Command::Remove { key } => {
            store.remove(&key)?;
            Ok(())
        }
        Command::Dump => print_json(&serde_json::to_value(store.snapshot())?),
        Command::Partitions => print_json(&partition_counts(&store)),
        Command::Migrate => run_migrate(&store),
        Command::Theme { name } => run_theme(&store, name.as_deref()),
    }
}

fn run_migrate(store: &NamespacedStore<FileBackend>) -> Result<(), CliError> {
    let theme_moved = store.migrate_theme_to_current_partition()?;
    let report = store.migrate_legacy_keys()?;
    let mut out = Map::new();
    out.insert("partition".to_owned(), Value::String(store.current_partition().to_string()));
    out.insert("theme_migrated".to_owned(), Value::Bool(theme_moved));
    out.insert("migrated".to_owned(), serde_json::to_value(&report.migrated)?);
    out.insert("skipped".to_owned(), serde_json::to_value(&report.skipped)?);
    print_json(&Value::Object(out))
}

fn run_theme(store: &NamespacedStore<FileBackend>, name: Option<&str>) -> Result<(), CliError> {
    let mut pref = ThemePreference::default();
    let theme = match name {
        Some(name) => pref.set_theme(store, name)?,
        None => pref.refresh(store),
    };
    println!("{theme}");
    Ok(())
}

fn partition_counts(store: &NamespacedStore<FileBackend>) -> Value {
    let root = store.snapshot();
    let mut out = Map::new();
    out.insert("global".to_owned(), Value::from(root.global.len()));
    for (id, entries) in &root.users {
        out.insert(id.clone(), Value::from(entries.len()));
    }
    let current = store.current_partition();
    if !out.contains_key(&current.as_key()) && current != PartitionId::Anonymous {
        out.insert(current.as_key(), Value::from(0));
    }
    Value::Object(out)
}

/// Interpret command-line text as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
