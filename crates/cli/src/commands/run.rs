//! `run` command implementation.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::shipper::{Shipper, ShipperConfig};

/// Execute the `run` command
pub async fn run_shipper(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    // Load and parse configuration
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        mode = %blueprint.mode,
        sink = %blueprint.sink.name,
        sink_type = ?blueprint.sink.sink_type,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let shipper = Shipper::new(ShipperConfig {
        blueprint,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    info!("Shipping stdin...");

    let stdin = BufReader::new(tokio::io::stdin());
    let stats = shipper
        .run(stdin, shutdown_signal())
        .await
        .context("Shipping failed")?;

    info!(
        lines = stats.lines_read,
        bytes = stats.bytes_read,
        rejected = stats.lines_rejected,
        duration_secs = stats.duration.as_secs_f64(),
        interrupted = stats.interrupted,
        "Shipping completed"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&stats.summary())
            .context("Failed to serialize run summary")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    info!("logship finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// If a handler can't be installed the corresponding signal is ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::ShipperBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Mode: {}", blueprint.mode);
    println!(
        "Sink: {} ({:?})",
        blueprint.sink.name, blueprint.sink.sink_type
    );
    let mut params: Vec<_> = blueprint.sink.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("  {} = {}", key, value);
    }
    println!();
}
