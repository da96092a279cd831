//! Watcher task bound to one timer incarnation

use aliveim_util::{ArmingId, DeviceId};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::expiry::ExpiryOutcome;
use crate::registry::WeakRegistry;

/// Counts one running watcher; decrements however the task ends
pub(crate) struct WatcherGuard(Arc<AtomicUsize>);

impl WatcherGuard {
    pub(crate) fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wait on the incarnation's deadline until it elapses unreset, or until
/// the entry is dropped from the registry.
pub(crate) async fn watch(
    registry: WeakRegistry,
    _guard: WatcherGuard,
    device_id: DeviceId,
    arming: ArmingId,
    mut deadline_rx: watch::Receiver<Instant>,
) {
    loop {
        let deadline = *deadline_rx.borrow_and_update();

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                let Some(registry) = registry.upgrade() else {
                    debug!(device_id = %device_id, arming = %arming, "Registry dropped, watcher exiting");
                    return;
                };

                match registry
                    .expiration()
                    .on_expired(&registry, &device_id, arming)
                    .await
                {
                    // A reset landed between the wake and the lock
                    ExpiryOutcome::Rearmed => {
                        trace!(device_id = %device_id, arming = %arming, "Woke on a superseded deadline");
                        continue;
                    }
                    outcome => {
                        trace!(device_id = %device_id, arming = %arming, ?outcome, "Watcher done");
                        return;
                    }
                }
            }
            changed = deadline_rx.changed() => {
                if changed.is_err() {
                    // Sender dropped with the entry: removed, cleared, or
                    // the registry itself went away
                    debug!(device_id = %device_id, arming = %arming, "Timer dropped, watcher exiting");
                    return;
                }
            }
        }
    }
}
