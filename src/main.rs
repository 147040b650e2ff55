//! BLE telemetry gateway CLI entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::info;

mod cli;
use cli::Cli;

use ble_telemetry_gateway::{GatewayConfig, Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "ble_telemetry_gateway=debug"
    } else {
        "ble_telemetry_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.parse()?),
        )
        .init();

    let cancel = setup_interrupt_handler();
    let config = GatewayConfig::from_env();

    info!(port = config.grpc_port, "starting BLE telemetry gateway");
    Supervisor::new(config).run(cancel).await?;

    Ok(())
}

/// Sets up a Ctrl-C handler that flips the returned flag to true when
/// triggered; every component polls it to unwind cleanly.
fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = Arc::clone(&cancel);

    ctrlc::set_handler(move || {
        cancel_clone.store(true, Ordering::SeqCst);
    })
    .ok();

    cancel
}
