//! Listener lifecycle tests against a fake BLE backend (no real hardware).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ble_telemetry_gateway::queue;
use dialog_ble_transport::config::SensorConfig;
use dialog_ble_transport::{gatt, BleSession, BleTransport, DiscoveredDevice, RawNotification, TransportError};
use futures::stream::BoxStream;
use tokio::sync::mpsc;

struct FakeSession {
    notifications: tokio::sync::Mutex<Option<mpsc::Receiver<RawNotification>>>,
}

#[async_trait]
impl BleSession for FakeSession {
    async fn read_config(&self) -> Result<SensorConfig, TransportError> {
        Ok(SensorConfig::DESIRED)
    }

    async fn write_config(&self, _config: &SensorConfig, _persist: bool) -> Result<(), TransportError> {
        Ok(())
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, RawNotification>, TransportError> {
        let rx = self.notifications.lock().await.take().expect("subscribe called once");
        Ok(Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx)))
    }

    async fn start(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

struct FakeTransport {
    tx: tokio::sync::Mutex<Option<mpsc::Sender<RawNotification>>>,
}

#[async_trait]
impl BleTransport for FakeTransport {
    async fn find(&self, _timeout: Duration) -> Result<Vec<DiscoveredDevice>, TransportError> {
        Ok(Vec::new())
    }

    async fn connect(&self, _address: &str) -> Result<Arc<dyn BleSession>, TransportError> {
        let (tx, rx) = mpsc::channel(8);
        *self.tx.lock().await = Some(tx);
        Ok(Arc::new(FakeSession {
            notifications: tokio::sync::Mutex::new(Some(rx)),
        }))
    }
}

#[tokio::test]
async fn listener_decodes_notifications_into_sensor_events() {
    let (sink, mut receiver) = queue::channel();
    let transport = Arc::new(FakeTransport {
        tx: tokio::sync::Mutex::new(None),
    });
    let cancel = Arc::new(AtomicBool::new(false));

    let transport_for_run: Arc<dyn BleTransport> = transport.clone();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        ble_telemetry_gateway::listener::run(
            transport_for_run,
            "80:EA:CA:00:00:01".to_string(),
            sink,
            run_cancel,
        )
        .await;
    });

    let tx = loop {
        if let Some(tx) = transport.tx.lock().await.clone() {
            break tx;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    let payload = vec![0x00, 0x00, 0x00, 0x40, 0x9C, 0x00, 0x00];
    tx.send(RawNotification {
        characteristic: gatt::BAROMETER_CHARACTERISTIC,
        data: payload,
    })
    .await
    .unwrap();

    let event = receiver.recv_timeout(Duration::from_secs(2)).await.unwrap();
    assert_eq!(event.address, "80:EA:CA:00:00:01");
    match event.reading {
        ble_telemetry_gateway::model::Reading::Barometer { hpa } => {
            assert!((hpa - 400.0).abs() < 1e-6)
        }
        other => panic!("unexpected reading: {other:?}"),
    }

    cancel.store(true, Ordering::Relaxed);
    drop(tx);
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
}

/// Watchdog termination (spec.md §8 property #6): a Listener that receives
/// no frames for `TIMEOUT_SECONDS` transitions to Terminated on its own,
/// without needing external cancellation.
#[tokio::test(start_paused = true)]
async fn listener_terminates_on_watchdog_timeout() {
    let (sink, _receiver) = queue::channel();
    let transport = Arc::new(FakeTransport {
        tx: tokio::sync::Mutex::new(None),
    });
    let cancel = Arc::new(AtomicBool::new(false));

    let transport_for_run: Arc<dyn BleTransport> = transport.clone();
    let handle = tokio::spawn(async move {
        ble_telemetry_gateway::listener::run(
            transport_for_run,
            "80:EA:CA:00:00:02".to_string(),
            sink,
            cancel,
        )
        .await;
    });

    // Let the listener reach Running (subscribed, waiting on its first
    // notification) before the clock advances.
    loop {
        if transport.tx.lock().await.is_some() {
            break;
        }
        tokio::time::advance(Duration::from_millis(10)).await;
    }

    tokio::time::advance(ble_telemetry_gateway::config::WATCHDOG_TIMEOUT + Duration::from_secs(1)).await;

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("listener must self-terminate once the watchdog trips")
        .unwrap();
}
