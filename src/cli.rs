//! CLI definitions.

use clap::Parser;

#[derive(Parser)]
#[command(name = "ble_telemetry_gateway")]
#[command(author, version, about = "BLE telemetry gateway for Dialog IoT sensor tags")]
pub struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}
