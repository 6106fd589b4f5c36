use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mijia::{Bridge, Config, Event, ReadingValue, Subscription};

/// mijia-bridge - LAN bridge for MiJia/Aqara gateways
#[derive(Parser)]
#[command(name = "mijia-bridge", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "MIJIA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the local receive port
    #[arg(long, env = "MIJIA_BIND_PORT")]
    bind_port: Option<u16>,

    /// Validate the config and exit
    #[arg(long)]
    check: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "info,mijia=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> mijia::Result<()> {
    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => {
            tracing::warn!("no config file given, gateways will be read-only");
            Config::default()
        }
    };
    if let Some(port) = cli.bind_port {
        config.network.bind_port = Some(port);
    }

    if cli.check {
        config.validate()?;
        tracing::info!(
            "config ok: {} gateway password(s), {} name override(s)",
            config.sid.len(),
            config.sensor_names.len()
        );
        return Ok(());
    }

    tracing::info!(
        gateways = config.sid.len(),
        bind_port = config.udp().bind_port,
        "starting mijia bridge"
    );

    let (bridge, handle) = Bridge::bind(config)?;
    let events = tokio::spawn(log_events(handle.subscribe(None)));

    bridge
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await;

    events.abort();
    Ok(())
}

/// Logs directory-facing events.
async fn log_events(mut events: Subscription) {
    while let Some(event) = events.recv().await {
        match event {
            Event::GatewayDiscovered { sid, addr, devices } => {
                tracing::info!("gateway {sid} at {addr} with {devices} devices");
            }
            Event::AccessoryAdded(accessory) => {
                tracing::info!(
                    "accessory {} \"{}\" ({:?})",
                    accessory.key,
                    accessory.name,
                    accessory.category
                );
            }
            Event::Reading(reading) => {
                if reading.value != ReadingValue::BatteryOnly {
                    tracing::info!("{}: {:?}", reading.key, reading.value);
                }
                if let Some(battery) = reading.battery.filter(|b| b.low) {
                    tracing::warn!("{}: low battery ({:?})", reading.key, battery.level);
                }
            }
            Event::AccessoriesRemoved(keys) => {
                tracing::info!("{} accessories removed", keys.len());
            }
            Event::WriteSent { sid, channel, on } => {
                tracing::debug!("write {sid} {channel}={on}");
            }
            Event::WriteAck => {}
        }
    }
}
