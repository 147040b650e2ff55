//! Stream Service (C7): republishes aggregated readings over gRPC server
//! streaming, one subscriber queue per open `ReadSensorStream` call (spec.md
//! §4.7).

use std::sync::{Arc, Mutex};

use prost_types::Timestamp;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::info;

pub mod sensor {
    tonic::include_proto!("sensor");
}

pub use sensor::grasp_verification_service_server::{
    GraspVerificationService, GraspVerificationServiceServer,
};
pub use sensor::{Empty, PerDeviceReadings, ReadSensorStreamResponse, Vector3};

use crate::model::OutputEvent;

/// Per-subscriber mailbox size. A slow or stalled client falls behind at
/// most this many broadcast ticks before its queue fills and `broadcast`
/// prunes it (spec.md §9 open question #1).
const SUBSCRIBER_CHANNEL_SIZE: usize = 16;

type Subscriber = mpsc::Sender<Result<ReadSensorStreamResponse, Status>>;

/// Holds the live set of subscriber channels. `broadcast` fans each tick out
/// to all of them and prunes any whose receiver has been dropped.
///
/// Cheaply `Clone` (an `Arc` around the subscriber list) since tonic's
/// generated server wraps this type directly, not a reference to it — the
/// Broadcaster and the gRPC server each hold their own clone pointing at the
/// same subscriber set.
#[derive(Clone)]
pub struct StreamService {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl StreamService {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sends one `OutputEvent` to every live subscriber. A subscriber whose
    /// `try_send` fails (full or closed) is dropped from the set; tonic
    /// drops the channel's `Receiver` when the client disconnects, so a
    /// closed send is the pruning signal spec.md's open question #1 asks
    /// for — no separate liveness check is needed.
    pub fn broadcast(&self, event: OutputEvent) {
        let response = to_proto(event);
        let mut subscribers = self.subscribers.lock().expect("subscriber mutex poisoned");
        subscribers.retain(|tx| tx.try_send(Ok(response.clone())).is_ok());
    }
}

impl Default for StreamService {
    fn default() -> Self {
        Self::new()
    }
}

fn to_proto(event: OutputEvent) -> ReadSensorStreamResponse {
    let timestamp = event
        .timestamp
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let device = event
        .devices
        .into_iter()
        .map(|d| PerDeviceReadings {
            address: d.address,
            acceleration: d.acceleration.map(|v| Vector3 { x: v.x, y: v.y, z: v.z }),
            gyroscope: d.gyroscope.map(|v| Vector3 { x: v.x, y: v.y, z: v.z }),
            pressure: d.pressure,
        })
        .collect();

    ReadSensorStreamResponse {
        timestamp: Some(Timestamp {
            seconds: timestamp.as_secs() as i64,
            nanos: timestamp.subsec_nanos() as i32,
        }),
        device,
    }
}

#[tonic::async_trait]
impl GraspVerificationService for StreamService {
    type ReadSensorStreamStream = ReceiverStream<Result<ReadSensorStreamResponse, Status>>;

    async fn read_sensor_stream(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::ReadSensorStreamStream>, Status> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_SIZE);
        self.subscribers
            .lock()
            .expect("subscriber mutex poisoned")
            .push(tx);
        info!("new sensor stream subscriber");
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PerDeviceReadings as ModelReadings;
    use std::time::SystemTime;

    fn sample_event() -> OutputEvent {
        OutputEvent {
            timestamp: SystemTime::now(),
            devices: vec![ModelReadings {
                address: "AA:BB:CC:11:22:33".to_string(),
                acceleration: None,
                gyroscope: None,
                pressure: Some(1013.0),
            }],
        }
    }

    #[tokio::test]
    async fn broadcast_prunes_dropped_subscribers() {
        let service = StreamService::new();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_SIZE);
        service.subscribers.lock().unwrap().push(tx);
        drop(rx);

        service.broadcast(sample_event());
        assert!(service.subscribers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn broadcast_delivers_to_live_subscriber() {
        let service = StreamService::new();
        let (tx, mut rx) = mpsc::channel(SUBSCRIBER_CHANNEL_SIZE);
        service.subscribers.lock().unwrap().push(tx);

        service.broadcast(sample_event());
        let received = rx.recv().await.unwrap().unwrap();
        assert_eq!(received.device.len(), 1);
        assert_eq!(received.device[0].pressure, Some(1013.0));
    }
}
