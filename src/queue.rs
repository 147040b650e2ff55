//! Sensor Queue (C2): bounded multi-producer/single-consumer channel
//! carrying `(address, sensor, reading)` events (spec.md §4.2).
//!
//! Capacity is sized so a momentary Aggregator stall up to one broadcast
//! period doesn't drop readings at steady-state for a fleet of <100 devices
//! at 100 Hz accelerometer.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::model::SensorEvent;

pub const QUEUE_CAPACITY: usize = 4096;

pub fn channel() -> (SensorEventSender, SensorEventReceiver) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (SensorEventSender(tx), SensorEventReceiver(rx))
}

#[derive(Clone)]
pub struct SensorEventSender(mpsc::Sender<SensorEvent>);

impl SensorEventSender {
    /// Blocks briefly if the Aggregator has fallen behind (spec.md §4.2).
    pub async fn send(&self, event: SensorEvent) -> Result<(), SensorEvent> {
        self.0.send(event).await.map_err(|e| e.0)
    }
}

pub struct SensorEventReceiver(mpsc::Receiver<SensorEvent>);

impl SensorEventReceiver {
    /// `try-receive-with-timeout`, giving the Aggregator a polling point for
    /// its stop flag (spec.md §4.2, §4.5 step 1).
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<SensorEvent> {
        tokio::time::timeout(timeout, self.0.recv())
            .await
            .ok()
            .flatten()
    }
}
