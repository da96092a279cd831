//! Expiration handling

use aliveim_notify::ExpiryNotifier;
use aliveim_util::{ArmingId, DeviceId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::registry::{ExpireCheck, TimerRegistry};

/// What happened when a watcher reached its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// Device removed and upstream notified
    Notified,
    /// Device removed; upstream notification failed
    NotifyFailed,
    /// Deadline was pushed out before removal; keep waiting
    Rearmed,
    /// Entry already gone or replaced by another incarnation
    Stale,
}

/// Removes expired devices and reports them upstream.
///
/// Removal happens before any I/O, so a report arriving while the notice
/// is in flight starts a fresh incarnation.
pub struct ExpirationNotifier {
    notifier: Arc<dyn ExpiryNotifier>,
}

impl ExpirationNotifier {
    pub fn new(notifier: Arc<dyn ExpiryNotifier>) -> Self {
        Self { notifier }
    }

    pub async fn on_expired(
        &self,
        registry: &TimerRegistry,
        device_id: &DeviceId,
        arming: ArmingId,
    ) -> ExpiryOutcome {
        match registry.expire(device_id, arming).await {
            ExpireCheck::Expired => {}
            ExpireCheck::Rearmed => return ExpiryOutcome::Rearmed,
            ExpireCheck::Gone => return ExpiryOutcome::Stale,
        }

        info!(device_id = %device_id, arming = %arming, "Device expired");

        // Registry lock is released here; notification is best-effort
        match self.notifier.notify_expired(device_id).await {
            Ok(()) => ExpiryOutcome::Notified,
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Failed to notify upstream of expiry");
                ExpiryOutcome::NotifyFailed
            }
        }
    }
}
