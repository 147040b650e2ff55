//! Real BLE backend, built on `btleplug`.
//!
//! Shape follows the scan/connect/discover/subscribe sequence common to
//! `btleplug`-based tools (see e.g. the scan-then-select-then-subscribe
//! flow in a typical central client): acquire a `Manager`, enumerate
//! adapters, scan with a `ScanFilter`, connect to the chosen peripheral,
//! discover its GATT services, locate characteristics by UUID, and drive
//! a `notifications()` stream.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{BoxStream, StreamExt};
use tracing::warn;

use crate::error::TransportError;
use crate::gatt;
use crate::types::{DiscoveredDevice, RawNotification};
use crate::{BleSession, BleTransport, BoxedSession, SensorConfig};

/// A host Bluetooth controller, wrapping a `btleplug` adapter handle.
#[derive(Clone)]
pub struct HostAdapter {
    adapter: Adapter,
    pub name: String,
}

/// Enumerates the host's BLE adapters (spec.md §6's "host BLE adapters").
/// `btleplug`'s `Manager::adapters()` is the "equivalent mechanism" the spec
/// allows in place of shelling out to `hcitool dev`.
pub async fn host_adapters() -> Result<Vec<HostAdapter>, TransportError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(TransportError::NoAdapter);
    }
    let mut out = Vec::with_capacity(adapters.len());
    for (i, adapter) in adapters.into_iter().enumerate() {
        let name = adapter
            .adapter_info()
            .await
            .unwrap_or_else(|_| format!("hci{i}"));
        out.push(HostAdapter { adapter, name });
    }
    Ok(out)
}

/// One discovery sweep on the given adapter (spec.md §4.4 step 2).
pub async fn scan(
    adapter: &HostAdapter,
    timeout: Duration,
) -> Result<Vec<DiscoveredDevice>, TransportError> {
    adapter
        .adapter
        .start_scan(ScanFilter::default())
        .await?;
    tokio::time::sleep(timeout).await;
    let peripherals = adapter.adapter.peripherals().await?;
    adapter.adapter.stop_scan().await?;

    let mut found = Vec::with_capacity(peripherals.len());
    for p in &peripherals {
        if let Ok(Some(props)) = p.properties().await {
            found.push(DiscoveredDevice {
                address: props.address.to_string(),
                name: props.local_name,
            });
        }
    }
    Ok(found)
}

/// `BleTransport` bound to a single host adapter; a `Listener` owns one of
/// these per spec.md §4.3/§4.4's adapter-assignment rule.
pub struct BtleplugBackend {
    adapter: HostAdapter,
}

impl BtleplugBackend {
    pub fn new(adapter: HostAdapter) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl BleTransport for BtleplugBackend {
    async fn find(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>, TransportError> {
        scan(&self.adapter, timeout).await
    }

    async fn connect(&self, address: &str) -> Result<BoxedSession, TransportError> {
        let peripherals = self.adapter.adapter.peripherals().await?;
        let mut target = None;
        for p in &peripherals {
            if let Ok(Some(props)) = p.properties().await {
                if props.address.to_string() == address {
                    target = Some(p.clone());
                    break;
                }
            }
        }
        let peripheral = target.ok_or(TransportError::DeviceNotFound)?;

        peripheral
            .connect()
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        peripheral
            .discover_services()
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        let chars = peripheral.characteristics();
        let mut by_uuid = HashMap::new();
        for uuid in [
            gatt::CONFIG_CHARACTERISTIC,
            gatt::CONTROL_CHARACTERISTIC,
            gatt::ACCELEROMETER_CHARACTERISTIC,
            gatt::GYROSCOPE_CHARACTERISTIC,
            gatt::BAROMETER_CHARACTERISTIC,
        ] {
            if let Some(c) = chars.iter().find(|c| c.uuid == uuid) {
                by_uuid.insert(uuid, c.clone());
            }
        }

        Ok(std::sync::Arc::new(BtleplugSession {
            peripheral,
            characteristics: by_uuid,
        }))
    }
}

/// One live GATT session. `characteristics` is a lookup into the discovered
/// service populated at connect time.
pub struct BtleplugSession {
    peripheral: Peripheral,
    characteristics: HashMap<uuid::Uuid, Characteristic>,
}

impl BtleplugSession {
    fn characteristic(&self, uuid: uuid::Uuid) -> Result<&Characteristic, TransportError> {
        self.characteristics
            .get(&uuid)
            .ok_or_else(|| TransportError::CharacteristicNotFound(uuid.to_string()))
    }
}

#[async_trait]
impl BleSession for BtleplugSession {
    async fn read_config(&self) -> Result<SensorConfig, TransportError> {
        let c = self.characteristic(gatt::CONFIG_CHARACTERISTIC)?;
        let data = self
            .peripheral
            .read(c)
            .await
            .map_err(|e| TransportError::ConfigFailed(e.to_string()))?;
        if data.len() < 4 {
            return Err(TransportError::ConfigFailed(format!(
                "short config read: {} bytes",
                data.len()
            )));
        }
        Ok(SensorConfig {
            sensor_combination: data[0],
            accelerometer_rate: data[1],
            accelerometer_range: data[2],
            gyroscope_range: data[3],
        })
    }

    async fn write_config(&self, config: &SensorConfig, persist: bool) -> Result<(), TransportError> {
        let c = self.characteristic(gatt::CONFIG_CHARACTERISTIC)?;
        let payload = [
            config.sensor_combination,
            config.accelerometer_rate,
            config.accelerometer_range,
            config.gyroscope_range,
            persist as u8,
        ];
        self.peripheral
            .write(c, &payload, WriteType::WithResponse)
            .await
            .map_err(|e| TransportError::ConfigFailed(e.to_string()))
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, RawNotification>, TransportError> {
        let sensor_chars = [
            gatt::ACCELEROMETER_CHARACTERISTIC,
            gatt::GYROSCOPE_CHARACTERISTIC,
            gatt::BAROMETER_CHARACTERISTIC,
        ];
        for uuid in sensor_chars {
            let c = self.characteristic(uuid)?;
            self.peripheral
                .subscribe(c)
                .await
                .map_err(|e| TransportError::SubscribeFailed(e.to_string()))?;
        }

        let notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(|e| TransportError::SubscribeFailed(e.to_string()))?;

        let stream = notifications.map(|n| RawNotification {
            characteristic: n.uuid,
            data: n.value,
        });
        Ok(Box::pin(stream))
    }

    async fn start(&self) -> Result<(), TransportError> {
        let c = self.characteristic(gatt::CONTROL_CHARACTERISTIC)?;
        // A single non-zero byte is the documented "start streaming" command;
        // the precise encoding of other control bytes is out of scope (spec.md §1).
        self.peripheral
            .write(c, &[0x01], WriteType::WithResponse)
            .await
            .map_err(|e| TransportError::ConfigFailed(e.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        match self.peripheral.disconnect().await {
            Ok(()) => Ok(()),
            Err(btleplug::Error::NotConnected) => Ok(()),
            Err(e) => {
                warn!("disconnect error (treated as best-effort): {}", e);
                Ok(())
            }
        }
    }
}
