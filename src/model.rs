//! Core data model for the ingest pipeline (spec.md §3).

use std::collections::HashMap;
use std::time::SystemTime;

/// Colon-separated 48-bit MAC, stringly-typed at every boundary.
pub type DeviceAddress = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Barometer,
}

/// Closed tagged union of decoded sensor readings (spec.md §3, §9 "Dynamic-typed readings").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Gravitational units (g).
    Accelerometer { x: f64, y: f64, z: f64 },
    /// Degrees per second.
    Gyroscope { x: f64, y: f64, z: f64 },
    /// Hectopascals.
    Barometer { hpa: f64 },
}

impl Reading {
    pub fn kind(&self) -> SensorKind {
        match self {
            Reading::Accelerometer { .. } => SensorKind::Accelerometer,
            Reading::Gyroscope { .. } => SensorKind::Gyroscope,
            Reading::Barometer { .. } => SensorKind::Barometer,
        }
    }
}

/// Produced by a Listener, consumed by the Aggregator.
#[derive(Debug, Clone)]
pub struct SensorEvent {
    pub address: DeviceAddress,
    pub reading: Reading,
}

/// At most one entry per kind; later events overwrite earlier ones.
pub type DeviceState = HashMap<SensorKind, Reading>;

/// Cleared wholesale on every aggregator snapshot (spec.md §3).
pub type AggregatorState = HashMap<DeviceAddress, DeviceState>;

#[derive(Debug, Clone, Copy, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone)]
pub struct PerDeviceReadings {
    pub address: DeviceAddress,
    pub acceleration: Option<Vector3>,
    pub gyroscope: Option<Vector3>,
    pub pressure: Option<f64>,
}

/// What the Broadcaster hands to the Stream Service on each tick.
#[derive(Debug, Clone)]
pub struct OutputEvent {
    pub timestamp: SystemTime,
    pub devices: Vec<PerDeviceReadings>,
}

/// Builds an `OutputEvent` from an aggregator snapshot, iterating addresses
/// in sorted order and attaching only the sensor fields present in the
/// snapshot (spec.md §3 `OutputEvent`, §4.6 step 4).
pub fn build_output_event(state: AggregatorState, timestamp: SystemTime) -> OutputEvent {
    let mut addresses: Vec<_> = state.keys().cloned().collect();
    addresses.sort();

    let devices = addresses
        .into_iter()
        .map(|address| {
            let dev_state = &state[&address];
            let acceleration = dev_state.get(&SensorKind::Accelerometer).map(|r| match r {
                Reading::Accelerometer { x, y, z } => Vector3 { x: *x, y: *y, z: *z },
                _ => unreachable!("keyed by kind"),
            });
            let gyroscope = dev_state.get(&SensorKind::Gyroscope).map(|r| match r {
                Reading::Gyroscope { x, y, z } => Vector3 { x: *x, y: *y, z: *z },
                _ => unreachable!("keyed by kind"),
            });
            let pressure = dev_state.get(&SensorKind::Barometer).map(|r| match r {
                Reading::Barometer { hpa } => *hpa,
                _ => unreachable!("keyed by kind"),
            });
            PerDeviceReadings {
                address,
                acceleration,
                gyroscope,
                pressure,
            }
        })
        .collect();

    OutputEvent { timestamp, devices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_event_sorts_addresses_and_attaches_present_fields() {
        let mut state: AggregatorState = HashMap::new();
        let mut dev_a = DeviceState::new();
        dev_a.insert(
            SensorKind::Accelerometer,
            Reading::Accelerometer { x: 1.0, y: 2.0, z: 3.0 },
        );
        dev_a.insert(SensorKind::Barometer, Reading::Barometer { hpa: 1013.25 });
        state.insert("AA:BB:CC:11:22:33".to_string(), dev_a);

        let mut dev_b = DeviceState::new();
        dev_b.insert(SensorKind::Barometer, Reading::Barometer { hpa: 999.0 });
        state.insert("11:11:11:11:11:11".to_string(), dev_b);

        let event = build_output_event(state, SystemTime::now());
        assert_eq!(event.devices.len(), 2);
        assert_eq!(event.devices[0].address, "11:11:11:11:11:11");
        assert!(event.devices[0].acceleration.is_none());
        assert_eq!(event.devices[1].address, "AA:BB:CC:11:22:33");
        let accel = event.devices[1].acceleration.unwrap();
        assert_eq!((accel.x, accel.y, accel.z), (1.0, 2.0, 3.0));
        assert_eq!(event.devices[1].pressure, Some(1013.25));
    }
}
