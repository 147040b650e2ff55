//! Broadcaster (C6): on a fixed period, snapshots the Aggregator and hands
//! the resulting `OutputEvent` to the Stream Service for fanout (spec.md §4.6).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::aggregator::Aggregator;
use crate::grpc::StreamService;
use crate::model::build_output_event;

/// Runs until `cancel` is set. Each tick, including the first, begins with
/// a sleep for the full period (spec.md §4.6 step 1) — unlike
/// `tokio::time::interval`, which fires immediately on its first tick, a
/// plain sleep-loop never broadcasts before one full period has elapsed. A
/// tick that finds an empty snapshot still broadcasts (spec.md §4.6 step 4
/// names no "skip if empty" rule).
pub async fn run(
    aggregator: Aggregator,
    stream_service: StreamService,
    period: Duration,
    cancel: Arc<AtomicBool>,
) {
    while !cancel.load(Ordering::Relaxed) {
        tokio::time::sleep(period).await;
        let snapshot = aggregator.snapshot();
        let event = build_output_event(snapshot, SystemTime::now());
        stream_service.broadcast(event);
    }
}
