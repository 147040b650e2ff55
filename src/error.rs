//! Gateway-level error type. Component internals use this or
//! `dialog_ble_transport::TransportError` and propagate with `?`;
//! `main()` wraps everything in `anyhow::Result` (spec expansion A2).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("no BLE adapters available on this host")]
    AdapterUnavailable,

    #[error(transparent)]
    Transport(#[from] dialog_ble_transport::TransportError),

    #[error("gRPC server bind failed: {0}")]
    BindFailed(String),
}
