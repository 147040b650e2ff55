//! Scanner (C4): periodically sweeps for Dialog tags and keeps exactly one
//! Listener alive per discovered address (spec.md §4.4).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

use dialog_ble_transport::{session, BleTransport};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{DIALOG_MAC_PREFIX, SCAN_IDLE, SCAN_TIMEOUT};
use crate::model::DeviceAddress;
use crate::queue::SensorEventSender;

struct ListenerHandle {
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Tracks the at-most-one-Listener-per-address invariant (spec.md §4.4,
/// §9 "Registry race").
pub struct ListenerRegistry {
    listeners: HashMap<DeviceAddress, ListenerHandle>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Drops join handles for listeners that have finished, returning how
    /// many were reaped.
    fn reap(&mut self) -> usize {
        let finished: Vec<_> = self
            .listeners
            .iter()
            .filter(|(_, h)| h.task.is_finished())
            .map(|(addr, _)| addr.clone())
            .collect();
        let count = finished.len();
        for addr in finished {
            self.listeners.remove(&addr);
        }
        count
    }

    fn contains(&self, address: &str) -> bool {
        self.listeners.contains_key(address)
    }

    fn insert(&mut self, address: DeviceAddress, handle: ListenerHandle) {
        self.listeners.insert(address, handle);
    }

    /// Signals and removes any existing listener for `address`, without
    /// waiting for its task to finish (spec.md §4.4 step 4: re-appearing in
    /// a scan implies the old session already lost its advertising slot, so
    /// the stale listener is replaced rather than left to be reaped later).
    fn terminate(&mut self, address: &str) {
        if let Some(handle) = self.listeners.remove(address) {
            handle.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Signals every live listener to stop and waits for them to finish
    /// (spec.md §4.8 shutdown order).
    pub async fn shutdown_all(&mut self) {
        for (_, handle) in self.listeners.iter() {
            handle.cancel.store(true, Ordering::Relaxed);
        }
        for (_, handle) in self.listeners.drain() {
            let _ = handle.task.await;
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One round-robin cursor over the host's BLE adapters, persisting across
/// sweeps so successive connects spread across available hardware (spec
/// expansion, SPEC_FULL.md "Supplemented Features").
struct AdapterRing {
    adapters: Vec<session::HostAdapter>,
    next: usize,
}

impl AdapterRing {
    fn next_adapter(&mut self) -> &session::HostAdapter {
        let adapter = &self.adapters[self.next % self.adapters.len()];
        self.next = self.next.wrapping_add(1);
        adapter
    }
}

/// Runs sweeps until `cancel` is set. A scan failure backs off for one idle
/// period and retries rather than exiting (spec.md §4.4 "back-off on scan
/// exception"). Adapter enumeration already happened at Supervisor startup
/// (spec.md §7 "Host-adapter unavailability ... Supervisor fails fast at
/// startup"), so `adapters` is guaranteed non-empty here.
///
/// Two independent round-robin cursors are kept over the same adapter list
/// (spec.md §4.4): `scan_ring` picks which adapter performs each sweep's
/// scan, `listener_ring` assigns each newly spawned Listener its own adapter
/// and advances per *Listener*, not per sweep — a sweep that discovers
/// several new tags at once must still spread their GATT sessions across
/// adapters instead of piling them all onto the adapter that happened to
/// scan.
pub async fn run(adapters: Vec<session::HostAdapter>, sink: SensorEventSender, cancel: Arc<AtomicBool>) {
    let mut scan_ring = AdapterRing {
        adapters: adapters.clone(),
        next: 0,
    };
    let mut listener_ring = AdapterRing { adapters, next: 0 };
    let mut registry = ListenerRegistry::new();

    while !cancel.load(Ordering::Relaxed) {
        let reaped = registry.reap();
        if reaped > 0 {
            info!(count = reaped, "reaped finished listeners");
        }

        let scan_adapter = scan_ring.next_adapter().clone();
        match session::scan(&scan_adapter, SCAN_TIMEOUT).await {
            Ok(devices) => {
                for device in devices {
                    if !is_dialog_tag(&device.address) {
                        continue;
                    }
                    if registry.contains(&device.address) {
                        info!(address = %device.address, "re-seen address, replacing existing listener");
                        registry.terminate(&device.address);
                    }
                    let listener_adapter = listener_ring.next_adapter().clone();
                    spawn_listener(&mut registry, &listener_adapter, device.address, sink.clone());
                }
            }
            Err(e) => {
                warn!(error = %e, "scan failed, backing off");
            }
        }

        tokio::time::sleep(SCAN_IDLE).await;
    }

    registry.shutdown_all().await;
}

/// spec.md §3: only addresses beginning with the Dialog OUI prefix are
/// accepted; everything else is ignored during a sweep.
fn is_dialog_tag(address: &str) -> bool {
    address.starts_with(DIALOG_MAC_PREFIX)
}

fn spawn_listener(
    registry: &mut ListenerRegistry,
    adapter: &session::HostAdapter,
    address: DeviceAddress,
    sink: SensorEventSender,
) {
    let backend: Arc<dyn BleTransport> = Arc::new(session::BtleplugBackend::new(adapter.clone()));
    let cancel = Arc::new(AtomicBool::new(false));
    let task_cancel = cancel.clone();
    let task_address = address.clone();

    let task = tokio::spawn(async move {
        crate::listener::run(backend, task_address, sink, task_cancel).await;
    });

    registry.insert(address, ListenerHandle { cancel, task });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_prefix_filter_accepts_only_matching_addresses() {
        assert!(is_dialog_tag("80:EA:CA:00:01:02"));
        assert!(!is_dialog_tag("AA:BB:CC:00:01:02"));
    }

    #[tokio::test]
    async fn registry_tracks_and_reaps_finished_listeners() {
        let mut registry = ListenerRegistry::new();
        let task = tokio::spawn(async {});

        registry.insert(
            "80:EA:CA:00:01:02".to_string(),
            ListenerHandle {
                cancel: Arc::new(AtomicBool::new(false)),
                task,
            },
        );

        assert!(registry.contains("80:EA:CA:00:01:02"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(registry.reap(), 1);
        assert!(!registry.contains("80:EA:CA:00:01:02"));
    }

    /// At-most-one-Listener-per-address (spec.md §8 property #2): a
    /// re-seen address cancels the stale handle and registers a fresh one,
    /// never leaving two entries for the same address.
    #[tokio::test]
    async fn re_seen_address_replaces_rather_than_duplicates() {
        let mut registry = ListenerRegistry::new();
        let address = "80:EA:CA:00:01:02".to_string();

        let old_cancel = Arc::new(AtomicBool::new(false));
        let old_cancel_for_task = old_cancel.clone();
        let old_task = tokio::spawn(async move {
            while !old_cancel_for_task.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        registry.insert(
            address.clone(),
            ListenerHandle {
                cancel: old_cancel.clone(),
                task: old_task,
            },
        );

        registry.terminate(&address);
        assert!(old_cancel.load(Ordering::Relaxed), "old listener must be signalled");
        assert!(!registry.contains(&address));

        registry.insert(
            address.clone(),
            ListenerHandle {
                cancel: Arc::new(AtomicBool::new(false)),
                task: tokio::spawn(async {}),
            },
        );
        assert_eq!(registry.listeners.len(), 1);
    }
}
