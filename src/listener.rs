//! Listener (C3): owns one live connection to one device for its lifetime
//! (spec.md §4.3).
//!
//! State machine: Connecting -> Configuring -> Subscribing -> Running ->
//! Terminated. Any step's error, the watchdog firing, or external
//! cancellation moves straight to Terminated; `disconnect` is always called
//! on the way out, best-effort.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dialog_ble_transport::config::SensorConfig;
use dialog_ble_transport::{BleSession, BleTransport, TransportError};
use futures::StreamExt;
use tracing::{info, warn};

use crate::config::WATCHDOG_TIMEOUT;
use crate::decode;
use crate::model::{DeviceAddress, Reading, SensorEvent};
use crate::queue::SensorEventSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Connecting,
    Configuring,
    Subscribing,
    Running,
    Terminated,
}

/// Runs one device's full lifecycle to completion. Returns once the session
/// terminates for any reason; never panics on device-side errors.
pub async fn run(
    transport: Arc<dyn BleTransport>,
    address: DeviceAddress,
    sink: SensorEventSender,
    cancel: Arc<AtomicBool>,
) {
    let mut state = ListenerState::Connecting;
    let outcome = drive(transport, &address, sink, cancel, &mut state).await;

    match outcome {
        Ok(()) => info!(address = %address, "listener terminated"),
        Err(e) => warn!(address = %address, error = %e, "listener terminated with error"),
    }
}

async fn drive(
    transport: Arc<dyn BleTransport>,
    address: &str,
    sink: SensorEventSender,
    cancel: Arc<AtomicBool>,
    state: &mut ListenerState,
) -> Result<(), TransportError> {
    let session = transport.connect(address).await?;

    *state = ListenerState::Configuring;
    let mut config = session.read_config().await?;
    if config != SensorConfig::DESIRED {
        session.write_config(&SensorConfig::DESIRED, true).await?;
        config = SensorConfig::DESIRED;
    }

    *state = ListenerState::Subscribing;
    let mut notifications = session.subscribe().await?;
    session.start().await?;

    *state = ListenerState::Running;
    let result = run_loop(address, &mut notifications, &sink, &cancel, &config).await;

    *state = ListenerState::Terminated;
    let _ = session.disconnect().await;
    result
}

async fn run_loop(
    address: &str,
    notifications: &mut (impl futures::Stream<Item = dialog_ble_transport::RawNotification> + Unpin),
    sink: &SensorEventSender,
    cancel: &Arc<AtomicBool>,
    config: &SensorConfig,
) -> Result<(), TransportError> {
    use dialog_ble_transport::gatt;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Ok(());
        }

        let next = tokio::time::timeout(WATCHDOG_TIMEOUT, notifications.next()).await;
        let notification = match next {
            Ok(Some(n)) => n,
            Ok(None) => return Ok(()),
            Err(_) => return Err(TransportError::Timeout),
        };

        let reading = if notification.characteristic == gatt::ACCELEROMETER_CHARACTERISTIC {
            decode::decode_accelerometer(&notification.data, config.accelerometer_range)
        } else if notification.characteristic == gatt::GYROSCOPE_CHARACTERISTIC {
            let range_dps = dialog_ble_transport::config::gyroscope_range_dps(config.gyroscope_range);
            decode::decode_gyroscope(&notification.data, range_dps)
        } else if notification.characteristic == gatt::BAROMETER_CHARACTERISTIC {
            decode::decode_barometer(&notification.data)
        } else {
            continue;
        };

        let reading: Reading = match reading {
            Ok(r) => r,
            Err(e) => {
                warn!(address = %address, error = %e, "dropping malformed frame");
                continue;
            }
        };

        let event = SensorEvent {
            address: address.to_string(),
            reading,
        };
        if sink.send(event).await.is_err() {
            return Ok(());
        }
    }
}

