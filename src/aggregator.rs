//! Aggregator (C5): folds the Sensor Queue into per-device latest-reading
//! state, snapshotting and clearing it wholesale on demand (spec.md §4.5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::model::AggregatorState;
use crate::queue::SensorEventReceiver;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct Aggregator {
    state: Arc<Mutex<AggregatorState>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AggregatorState::new())),
        }
    }

    /// Takes the current state, leaving an empty map behind (spec.md §3, §4.5
    /// step 4: "cleared wholesale on every aggregator snapshot").
    pub fn snapshot(&self) -> AggregatorState {
        let mut guard = self.state.lock().expect("aggregator mutex poisoned");
        std::mem::take(&mut *guard)
    }

    /// Consumes from the Sensor Queue until `cancel` is set, polling on a
    /// bounded timeout so the stop flag is checked even when no readings
    /// arrive (spec.md §4.5 step 1).
    pub async fn run(&self, mut receiver: SensorEventReceiver, cancel: Arc<AtomicBool>) {
        while !cancel.load(Ordering::Relaxed) {
            match receiver.recv_timeout(POLL_INTERVAL).await {
                Some(event) => {
                    let mut guard = self.state.lock().expect("aggregator mutex poisoned");
                    guard
                        .entry(event.address)
                        .or_default()
                        .insert(event.reading.kind(), event.reading);
                }
                None => continue,
            }
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Reading, SensorEvent};

    #[test]
    fn snapshot_clears_state() {
        let agg = Aggregator::new();
        {
            let mut guard = agg.state.lock().unwrap();
            guard
                .entry("AA:BB:CC:11:22:33".to_string())
                .or_default()
                .insert(
                    crate::model::SensorKind::Barometer,
                    Reading::Barometer { hpa: 1013.0 },
                );
        }
        let snap = agg.snapshot();
        assert_eq!(snap.len(), 1);
        assert!(agg.snapshot().is_empty());
    }

    #[tokio::test]
    async fn run_folds_events_until_cancelled() {
        let (tx, rx) = crate::queue::channel();
        let agg = Aggregator::new();
        let cancel = Arc::new(AtomicBool::new(false));

        let agg2 = agg.clone();
        let cancel2 = cancel.clone();
        let handle = tokio::spawn(async move { agg2.run(rx, cancel2).await });

        tx.send(SensorEvent {
            address: "AA:BB:CC:11:22:33".to_string(),
            reading: Reading::Barometer { hpa: 1000.0 },
        })
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.store(true, Ordering::Relaxed);
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;

        let snap = agg.snapshot();
        assert_eq!(snap.len(), 1);
    }
}
