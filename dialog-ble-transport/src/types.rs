//! Common types for the BLE transport layer.

/// A device observed during a scan window, before any GATT connection.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Colon-separated MAC address, as advertised.
    pub address: String,
    /// Advertised local name, if any.
    pub name: Option<String>,
}

/// A single raw BLE notification, tagged by the characteristic it arrived
/// on. The gateway's frame decoder (not this crate) interprets `data`.
#[derive(Debug, Clone)]
pub struct RawNotification {
    pub characteristic: uuid::Uuid,
    pub data: Vec<u8>,
}
