//! CLI command implementations
//!
//! Every command except `init` boots the same way: load config, open the
//! record log, replay it into an `OfflineStore`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::http_server::{AppState, HttpServer};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::storage::FileLog;
use crate::store::OfflineStore;
use crate::submitter::{
    KeystreamEncryptor, LedgerMinter, SampledValidator, TaskOrchestrator, VoiceInterface,
};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_payload, write_line, write_response};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Store {
            config,
            record_type,
        } => store(&config, &record_type),
        Command::Retrieve {
            config,
            record_type,
        } => retrieve(&config, &record_type),
        Command::Dump { config } => dump(&config),
        Command::Stats { config } => stats(&config),
        Command::Compact { config } => compact(&config),
    }
}

fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("data").is_dir()
}

/// Loads config and applies its log level. One-shot commands keep stdout
/// for their own output.
fn load_config(config_path: &Path, one_shot: bool) -> CliResult<Config> {
    Logger::set_stderr_only(one_shot);
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", &config.data_dir)]);
    Ok(config)
}

fn open_store(config: &Config) -> CliResult<Arc<OfflineStore>> {
    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::NotInitialized(data_dir.to_path_buf()));
    }

    let log = FileLog::open(data_dir)
        .map_err(|e| CliError::boot(format!("Failed to open record log: {}", e)))?;
    let store = OfflineStore::open(config.store.clone(), log)
        .map_err(|e| CliError::boot(format!("Replay failed: {}", e)))?;

    Ok(Arc::new(store))
}

/// Create the data directory. Writes no records.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path, true)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::AlreadyInitialized(data_dir.to_path_buf()));
    }

    let data_subdir = data_dir.join("data");
    fs::create_dir_all(&data_subdir).map_err(|e| {
        CliError::config(format!("Failed to create directory {:?}: {}", data_subdir, e))
    })?;

    write_response(json!({"initialized": true, "data_dir": config.data_dir}))
}

/// Replay the log and serve HTTP until ctrl-c.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);
    let mut config = load_config(config_path, false)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let store = open_store(&config)?;

    let orchestrator = TaskOrchestrator::new(
        Arc::clone(&store),
        Arc::new(SampledValidator::default()),
        Arc::new(LedgerMinter::default()),
        config.tasks.clone(),
    );
    let voice = VoiceInterface::new(
        Arc::clone(&store),
        Arc::new(KeystreamEncryptor::generate()),
        config.tasks.voice_mode,
    );
    let state = Arc::new(AppState {
        store,
        orchestrator,
        voice,
    });

    let server = HttpServer::new(config.http.clone(), state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot(format!("HTTP server failed: {}", e)))
    })
}

/// Store one payload from stdin.
pub fn store(config_path: &Path, record_type: &str) -> CliResult<()> {
    let config = load_config(config_path, true)?;
    let store = open_store(&config)?;

    let payload = read_payload()?;
    let outcome = store.store(record_type, &payload)?;

    write_response(serde_json::to_value(outcome)?)
}

pub fn retrieve(config_path: &Path, record_type: &str) -> CliResult<()> {
    let config = load_config(config_path, true)?;
    let store = open_store(&config)?;

    let records = store.retrieve(record_type)?;
    write_response(json!({"total": records.len(), "records": records}))
}

/// One `(id, type, data, timestamp)` row per line, oldest first.
pub fn dump(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path, true)?;
    let store = open_store(&config)?;

    for row in store.rows()? {
        write_line(&row)?;
    }
    Ok(())
}

pub fn stats(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path, true)?;
    let store = open_store(&config)?;

    write_response(serde_json::to_value(store.stats()?)?)
}

pub fn compact(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path, true)?;
    let store = open_store(&config)?;

    let reclaimed = store.compact()?;
    let stats = store.stats()?;
    write_response(json!({
        "reclaimed_bytes": reclaimed,
        "log_size_bytes": stats.log_size_bytes,
    }))
}
