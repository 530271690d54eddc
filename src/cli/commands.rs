//! CLI command implementations
//!
//! Every command loads the config first and prints a single JSON response.
//! `run` is the only command that boots the node; `dump` never writes to
//! the storage image.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::NodeConfig;
use crate::connectivity::{MqttGate, SimulatedTransport};
use crate::flush::FlushCoordinator;
use crate::node::Node;
use crate::observability::{log_event, Event, Logger};
use crate::record_log::RecordLog;
use crate::store::{ByteStore, FileStore, StoreErrorCode};
use crate::telemetry::SimulatedSensors;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command, and report a failure as JSON
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(e) = &result {
        let _ = write_error(e.code_str(), e.message());
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Run { config, ticks } => run_node(&config, ticks),
        Command::Dump { config } => dump(&config),
        Command::Erase { config } => erase(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<NodeConfig> {
    let config = NodeConfig::load(config_path)?;
    Logger::set_min_severity(config.log_level);
    let path = config.store_path.display().to_string();
    log_event(Event::ConfigLoaded, &[("store_path", path.as_str())]);
    Ok(config)
}

fn open_existing(config: &NodeConfig) -> CliResult<FileStore> {
    if !FileStore::exists(&config.store_path) {
        return Err(CliError::not_initialized(&config.store_path));
    }
    Ok(FileStore::open(&config.store_path, config.storage_size)?)
}

/// Opens the image for boot, replacing a corrupt one when
/// `recover_corrupt_log` is set.
fn open_for_boot(config: &NodeConfig) -> CliResult<FileStore> {
    if !FileStore::exists(&config.store_path) {
        return Err(CliError::not_initialized(&config.store_path));
    }
    match FileStore::open(&config.store_path, config.storage_size) {
        Ok(store) => Ok(store),
        Err(e) if e.code() == StoreErrorCode::Corruption && config.recover_corrupt_log => {
            let reason = e.to_string();
            Ok(reset_image(config, &reason)?.into_store())
        }
        Err(e) => Err(e.into()),
    }
}

/// Zeroes the image without reading it first.
fn reset_image(config: &NodeConfig, reason: &str) -> CliResult<RecordLog<FileStore>> {
    let path = config.store_path.display().to_string();
    Logger::warn(
        Event::StoreImageDiscarded.as_str(),
        &[("path", path.as_str()), ("reason", reason)],
    );
    let store = FileStore::blank(&config.store_path, config.storage_size);
    Ok(RecordLog::load_with(store, config.max_slots, true)?)
}

/// Create a zeroed storage image
///
/// Refuses to touch an existing image; use `erase` for that.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if FileStore::exists(&config.store_path) {
        return Err(CliError::already_initialized(&config.store_path));
    }

    let store = FileStore::open(&config.store_path, config.storage_size)?;
    let log = RecordLog::load_with(store, config.max_slots, true)?;

    write_response(json!({
        "initialized": true,
        "store_path": config.store_path.display().to_string(),
        "capacity": log.layout().capacity(),
        "max_slots": log.layout().max_slots(),
        "data_start": log.layout().header_end(),
        "data_limit": log.layout().data_limit(),
    }))
}

/// Boot the node and run the tick loop
///
/// Runs until `ticks` have completed, or forever. Sensors and transport are
/// the seeded simulations from the config.
pub fn run_node(config_path: &Path, ticks: Option<u64>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_for_boot(&config)?;

    let sim = &config.simulation;
    let sensors = SimulatedSensors::simulated(sim.seed, sim.sensor_failure_probability);
    let transport = SimulatedTransport::new(
        config.link_profile(),
        sim.seed.map(|seed| seed.wrapping_add(2)),
    );
    let gate = MqttGate::new(
        transport,
        config.feed.clone(),
        config.connect_retry(),
        config.publish_retry(),
    );

    let mut node = Node::boot(
        store,
        &config.log_options(),
        sensors,
        gate,
        FlushCoordinator::new(config.drain_policy),
    )?
    .with_tick_interval(config.tick_interval());

    let metrics = node.run(ticks)?;

    write_response(json!({
        "metrics": metrics,
        "pending": node.log().len(),
        "delivered": node.gate().transport().delivered(),
    }))
}

/// Print pending records
pub fn dump(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_existing(&config)?;
    let log = RecordLog::load(store, config.max_slots)?;

    let records: Vec<Value> = log
        .pending_records()?
        .into_iter()
        .map(|(offset, payload)| {
            json!({
                "offset": offset,
                "length": payload.len(),
                "payload": String::from_utf8_lossy(&payload),
            })
        })
        .collect();

    write_response(json!({
        "capacity": log.store().capacity(),
        "write_cursor": log.write_cursor(),
        "free_bytes": log.free_bytes(),
        "free_slots": log.free_slots(),
        "records": records,
    }))
}

/// Zero the storage image
///
/// Works on a corrupt image too; the old image is never read.
pub fn erase(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    if !FileStore::exists(&config.store_path) {
        return Err(CliError::not_initialized(&config.store_path));
    }
    let log = reset_image(&config, "erase requested")?;

    write_response(json!({
        "erased": true,
        "write_cursor": log.write_cursor(),
    }))
}
