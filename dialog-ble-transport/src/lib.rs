//! BLE transport abstraction for Dialog IoT-DK-SFL sensor tags.
//!
//! Mirrors the teacher's HID transport crate shape (a trait at the
//! connection boundary plus a single real backend): `BleTransport` performs
//! discovery and connects; `BleSession` owns one live GATT session and
//! exposes config read/write, raw notification subscription, start, and
//! disconnect. The sensor frame decoder lives in the binary crate, not here,
//! since decoding is in-scope pipeline logic rather than transport I/O.

pub mod config;
pub mod error;
pub mod gatt;
pub mod session;
pub mod types;

pub use config::SensorConfig;
pub use error::TransportError;
pub use session::{host_adapters, scan, BtleplugSession, HostAdapter};
pub use types::{DiscoveredDevice, RawNotification};

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;

/// One live GATT connection to a tag. Implementations must make
/// `disconnect` idempotent (spec.md §4.3 step 5: "best-effort, idempotent").
#[async_trait]
pub trait BleSession: Send + Sync {
    async fn read_config(&self) -> Result<SensorConfig, TransportError>;

    /// `persist` controls whether the write is committed to device EEPROM
    /// (spec.md §4.3 step 2; defaulted `true` by callers).
    async fn write_config(&self, config: &SensorConfig, persist: bool) -> Result<(), TransportError>;

    /// Registers notification handlers for accelerometer, gyroscope, and
    /// barometer and returns the merged stream of raw payloads.
    async fn subscribe(&self) -> Result<BoxStream<'static, RawNotification>, TransportError>;

    /// Sends the device's start-streaming command.
    async fn start(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Type alias for a boxed session, analogous to the teacher's `BoxedTransport`.
pub type BoxedSession = Arc<dyn BleSession>;

/// Host-adapter-scoped discovery and connect surface.
#[async_trait]
pub trait BleTransport: Send + Sync {
    async fn find(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>, TransportError>;

    async fn connect(&self, address: &str) -> Result<BoxedSession, TransportError>;
}
