//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BufferConfig, QueueConfig, ShipperBlueprint};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
///
/// Tuning values are shown resolved, so zeros appear as their defaults.
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    mode: String,
    buffer: BufferConfig,
    queue: QueueConfig,
    sink: SinkInfo,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &ShipperBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        mode: blueprint.mode.to_string(),
        buffer: blueprint.buffer.resolved(),
        queue: blueprint.queue.resolved(),
        sink: SinkInfo {
            name: blueprint.sink.name.clone(),
            sink_type: format!("{:?}", blueprint.sink.sink_type),
            params: blueprint
                .sink
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  logship Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🚀 Delivery");
    println!("   ├─ Version: {}", info.version);
    println!("   └─ Mode: {}", info.mode);

    println!("\n📦 Batching Buffer");
    println!("   ├─ Buffer size: {} bytes", info.buffer.buffer_size);
    println!("   ├─ Idle timeout: {} ms", info.buffer.idle_timeout_ms);
    println!("   ├─ Pending flushes: {}", info.buffer.pending_flushes);
    println!("   ├─ Write retries: {}", info.buffer.write_retries);
    println!("   └─ Command capacity: {}", info.buffer.command_capacity);

    println!("\n🚚 Dispatch Queue");
    println!("   ├─ Capacity: {}", info.queue.capacity);
    println!("   └─ Concurrency: {}", info.queue.concurrency);

    println!("\n📤 Sink");
    println!("   ├─ Name: {}", info.sink.name);
    if info.sink.params.is_empty() {
        println!("   └─ Type: {}", info.sink.sink_type);
    } else {
        println!("   ├─ Type: {}", info.sink.sink_type);
        println!("   └─ Params");
        let count = info.sink.params.len();
        for (i, (key, value)) in info.sink.params.iter().enumerate() {
            let prefix = if i == count - 1 { "└─" } else { "├─" };
            println!("      {} {} = {}", prefix, key, value);
        }
    }

    println!();
}
