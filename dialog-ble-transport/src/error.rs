//! Transport error types

use thiserror::Error;

/// Errors surfaced at the transport boundary. Listener lifecycle transitions
/// key off these variants directly (spec.md §4.3).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no BLE adapters available on this host")]
    NoAdapter,

    #[error("device not found during scan")]
    DeviceNotFound,

    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("config read/write failed: {0}")]
    ConfigFailed(String),

    #[error("notification subscribe failed: {0}")]
    SubscribeFailed(String),

    #[error("malformed frame: expected at least {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(String),

    #[error("operation timed out")]
    Timeout,

    #[error("BLE stack error: {0}")]
    BleError(String),
}

impl From<btleplug::Error> for TransportError {
    fn from(e: btleplug::Error) -> Self {
        TransportError::BleError(e.to_string())
    }
}

impl From<uuid::Error> for TransportError {
    fn from(e: uuid::Error) -> Self {
        TransportError::BleError(e.to_string())
    }
}
