//! Terminal chat client for the CSV analysis service.

use anyhow::Context;
use clap::Parser;
use csvchat_config::{CsvChatConfig, LayeredConfigOptions};
use csvchat_core::backend_from_config;
use log::{debug, info};
use std::fs::OpenOptions;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Command-line options for the TUI client.
#[derive(Parser)]
#[command(name = "csvchat", version)]
struct Cli {
    /// Optional path to a csvchat.json5 layered over the discovered configs
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the analysis endpoint URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Payers CSV attached to every query
    #[arg(long)]
    payers: Option<PathBuf>,
    /// Transactions CSV attached to every query
    #[arg(long)]
    transactions: Option<PathBuf>,
    /// Answer with a canned reply instead of calling the API
    #[arg(long)]
    simulate: bool,
    /// Name shown in the welcome greeting
    #[arg(long)]
    user: Option<String>,
    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Entry point for the csvchat TUI client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    info!(
        "starting csvchat (config_set={}, endpoint_set={}, simulate={})",
        cli.config.is_some(),
        cli.endpoint.is_some(),
        cli.simulate
    );
    let config = load_config(&cli)?;
    let user_name = csvchat_tui::resolve_user_name(config.ui.user_name.as_deref());
    let backend = backend_from_config(&config);
    csvchat_tui::run(config, user_name, backend).await
}

/// Initialise `env_logger`; `--log-file` sends records to a file instead of stderr.
fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder = env_logger::builder();
    builder.format_timestamp_millis().parse_default_env();
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
    Ok(())
}

/// Load layered config with command-line flags as the top override layer.
fn load_config(cli: &Cli) -> anyhow::Result<CsvChatConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    info!("loading layered config from cwd: {}", cwd.display());
    let mut options = LayeredConfigOptions::new(&cwd).with_overrides(flag_overrides(cli));
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered =
        CsvChatConfig::load_layered_with_options(options).context("failed to load config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

/// Flags that were given, shaped like a config layer.
fn flag_overrides(cli: &Cli) -> Value {
    let mut api = Map::new();
    let mut files = Map::new();
    let mut reply = Map::new();
    let mut ui = Map::new();
    if let Some(endpoint) = &cli.endpoint {
        api.insert("endpoint".into(), Value::String(endpoint.clone()));
    }
    if let Some(payers) = &cli.payers {
        files.insert("payers".into(), path_value(payers));
    }
    if let Some(transactions) = &cli.transactions {
        files.insert("transactions".into(), path_value(transactions));
    }
    if cli.simulate {
        reply.insert("mode".into(), Value::String("simulated".into()));
    }
    if let Some(user) = &cli.user {
        ui.insert("user_name".into(), Value::String(user.clone()));
    }

    let mut layer = Map::new();
    for (section, fields) in [("api", api), ("files", files), ("reply", reply), ("ui", ui)] {
        if !fields.is_empty() {
            layer.insert(section.into(), Value::Object(fields));
        }
    }
    Value::Object(layer)
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}
