//! Timer registry

use aliveim_api::DeviceStatus;
use aliveim_notify::ExpiryNotifier;
use aliveim_util::{ArmingId, DeviceId, duration_to_millis, is_immediate, timeout_from_millis};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::expiry::ExpirationNotifier;
use crate::watcher::{self, WatcherGuard};

/// Result of an alive report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOutcome {
    /// True if no timer existed and a new one was armed
    pub created: bool,
    /// Incarnation the report landed on
    pub arming: ArmingId,
}

/// Verdict of an expiry check made under the registry lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireCheck {
    /// Entry was this incarnation and past its deadline; it has been removed
    Expired,
    /// Entry is this incarnation but a reset pushed its deadline out
    Rearmed,
    /// Entry is absent or belongs to another incarnation
    Gone,
}

/// One live device timer
#[derive(Debug)]
struct TimerEntry {
    arming: ArmingId,
    /// Current deadline; the watcher holds the receiving end
    deadline_tx: watch::Sender<Instant>,
    timeout_ms: i32,
    reported_at: DateTime<Local>,
}

impl TimerEntry {
    fn deadline(&self) -> Instant {
        *self.deadline_tx.borrow()
    }

    fn rearm(&mut self, deadline: Instant, timeout_ms: i32) {
        // send_replace never fails, even if the watcher is mid-exit
        self.deadline_tx.send_replace(deadline);
        self.timeout_ms = timeout_ms;
        self.reported_at = aliveim_util::now();
    }
}

struct Inner {
    entries: Mutex<HashMap<DeviceId, TimerEntry>>,
    expiration: ExpirationNotifier,
    /// Shared with each watcher's guard so it outlives `Inner`
    watchers: Arc<AtomicUsize>,
}

/// Registry of live device timers.
///
/// Cloning is cheap and yields a handle to the same registry. Every
/// mutation goes through one mutex; it is never held across notification
/// I/O. Watchers only hold weak handles: dropping the last
/// `TimerRegistry` drops every entry and ends every watcher silently.
#[derive(Clone)]
pub struct TimerRegistry {
    inner: Arc<Inner>,
}

/// Non-owning handle held by watcher tasks
#[derive(Clone)]
pub(crate) struct WeakRegistry {
    inner: Weak<Inner>,
}

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<TimerRegistry> {
        self.inner.upgrade().map(|inner| TimerRegistry { inner })
    }
}

impl TimerRegistry {
    pub fn new(notifier: Arc<dyn ExpiryNotifier>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                expiration: ExpirationNotifier::new(notifier),
                watchers: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Reset the device's timer, or create it if the device is not live.
    ///
    /// A non-positive `timeout_ms` arms a timer that fires immediately.
    /// Must be called from within a tokio runtime.
    pub async fn report_alive(&self, device_id: DeviceId, timeout_ms: i32) -> ReportOutcome {
        let deadline = Instant::now() + timeout_from_millis(timeout_ms);
        if is_immediate(timeout_ms) {
            debug!(device_id = %device_id, timeout_ms, "Non-positive timeout, expiring immediately");
        }

        let mut entries = self.inner.entries.lock().await;

        if let Some(entry) = entries.get_mut(&device_id) {
            entry.rearm(deadline, timeout_ms);
            debug!(device_id = %device_id, arming = %entry.arming, timeout_ms, "Device timer reset");
            return ReportOutcome {
                created: false,
                arming: entry.arming,
            };
        }

        let arming = ArmingId::next();
        let (deadline_tx, deadline_rx) = watch::channel(deadline);
        entries.insert(
            device_id.clone(),
            TimerEntry {
                arming,
                deadline_tx,
                timeout_ms,
                reported_at: aliveim_util::now(),
            },
        );

        info!(device_id = %device_id, arming = %arming, timeout_ms, "Device timer created");

        let guard = WatcherGuard::new(self.inner.watchers.clone());
        tokio::spawn(watcher::watch(
            self.downgrade(),
            guard,
            device_id,
            arming,
            deadline_rx,
        ));

        ReportOutcome {
            created: true,
            arming,
        }
    }

    /// Remove a device without notifying.
    ///
    /// Idempotent: returns false if the device was not live.
    pub async fn remove(&self, device_id: &DeviceId) -> bool {
        let removed = self.inner.entries.lock().await.remove(device_id).is_some();
        if removed {
            info!(device_id = %device_id, "Device deregistered");
        }
        removed
    }

    /// Remove the device if `arming` still owns it and its deadline has passed.
    pub async fn expire(&self, device_id: &DeviceId, arming: ArmingId) -> ExpireCheck {
        let mut entries = self.inner.entries.lock().await;

        match entries.get(device_id) {
            Some(entry) if entry.arming == arming => {
                if entry.deadline() <= Instant::now() {
                    entries.remove(device_id);
                    ExpireCheck::Expired
                } else {
                    ExpireCheck::Rearmed
                }
            }
            _ => ExpireCheck::Gone,
        }
    }

    /// Drop every entry. Watchers exit without notifying.
    pub async fn clear(&self) -> usize {
        let mut entries = self.inner.entries.lock().await;
        let count = entries.len();
        entries.clear();
        if count > 0 {
            info!(count, "Registry cleared");
        }
        count
    }

    pub async fn is_live(&self, device_id: &DeviceId) -> bool {
        self.inner.entries.lock().await.contains_key(device_id)
    }

    pub async fn status(&self, device_id: &DeviceId) -> Option<DeviceStatus> {
        let entries = self.inner.entries.lock().await;
        let entry = entries.get(device_id)?;

        let remaining = entry.deadline().saturating_duration_since(Instant::now());
        Some(DeviceStatus {
            device_id: device_id.clone(),
            timeout_ms: entry.timeout_ms,
            remaining_ms: duration_to_millis(remaining),
            reported_at: entry.reported_at,
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.lock().await.is_empty()
    }

    /// Number of watcher tasks still running
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.load(Ordering::SeqCst)
    }

    pub(crate) fn expiration(&self) -> &ExpirationNotifier {
        &self.inner.expiration
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliveim_notify::MockNotifier;
    use std::time::Duration;

    fn make_registry() -> (TimerRegistry, MockNotifier) {
        let mock = MockNotifier::new();
        let registry = TimerRegistry::new(Arc::new(mock.clone()));
        (registry, mock)
    }

    /// Let due watchers fire and finish their notification
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_report_creates() {
        let (registry, _mock) = make_registry();
        let device = DeviceId::new("abc123");

        let outcome = registry.report_alive(device.clone(), 300).await;

        assert!(outcome.created);
        assert!(registry.is_live(&device).await);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.watcher_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_report_resets_without_new_watcher() {
        let (registry, _mock) = make_registry();
        let device = DeviceId::new("abc123");

        let first = registry.report_alive(device.clone(), 300).await;
        tokio::time::advance(Duration::from_millis(100)).await;
        let second = registry.report_alive(device.clone(), 1000).await;

        assert!(!second.created);
        assert_eq!(first.arming, second.arming);
        assert_eq!(registry.watcher_count(), 1);

        let status = registry.status(&device).await.unwrap();
        assert_eq!(status.timeout_ms, 1000);
        assert_eq!(status.remaining_ms, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn unreset_device_expires_once() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        registry.report_alive(device.clone(), 300).await;

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(registry.is_live(&device).await);

        tokio::time::sleep(Duration::from_millis(50)).await;
        settle().await;

        assert!(!registry.is_live(&device).await);
        assert_eq!(mock.count_for(&device), 1);
        assert_eq!(registry.watcher_count(), 0);

        // Nothing further fires
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_suppresses_original_arming() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        registry.report_alive(device.clone(), 300).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        registry.report_alive(device.clone(), 300).await;

        // Past the original deadline
        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        assert!(registry.is_live(&device).await);
        assert!(mock.calls().is_empty());

        // Past the new deadline
        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;
        assert!(!registry.is_live(&device).await);
        assert_eq!(mock.count_for(&device), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_can_shorten_deadline() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        registry.report_alive(device.clone(), 10_000).await;
        registry.report_alive(device.clone(), 100).await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;

        assert!(!registry.is_live(&device).await);
        assert_eq!(mock.count_for(&device), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_absent_is_noop() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("never-seen");

        assert!(!registry.remove(&device).await);
        assert!(!registry.remove(&device).await);
        assert!(registry.is_empty().await);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn removed_device_never_notifies() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        registry.report_alive(device.clone(), 300).await;
        assert!(registry.remove(&device).await);

        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;

        assert!(mock.calls().is_empty());
        assert_eq!(registry.watcher_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_then_recreated_gets_new_incarnation() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        let first = registry.report_alive(device.clone(), 300).await;
        registry.remove(&device).await;
        let second = registry.report_alive(device.clone(), 500).await;

        assert!(second.created);
        assert_ne!(first.arming, second.arming);

        // The stale watcher must not reap the new incarnation
        tokio::time::sleep(Duration::from_millis(400)).await;
        settle().await;
        assert!(registry.is_live(&device).await);
        assert_eq!(registry.expire(&device, first.arming).await, ExpireCheck::Gone);

        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        assert!(!registry.is_live(&device).await);
        assert_eq!(mock.count_for(&device), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_timeout_fires_immediately() {
        let (registry, mock) = make_registry();
        let zero = DeviceId::new("zero");
        let negative = DeviceId::new("negative");

        assert!(registry.report_alive(zero.clone(), 0).await.created);
        assert!(registry.report_alive(negative.clone(), -100).await.created);
        settle().await;

        assert!(registry.is_empty().await);
        assert_eq!(mock.count_for(&zero), 1);
        assert_eq!(mock.count_for(&negative), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expire_check_verdicts() {
        let (registry, _mock) = make_registry();
        let device = DeviceId::new("abc123");

        let outcome = registry.report_alive(device.clone(), 300).await;
        assert_eq!(registry.expire(&device, outcome.arming).await, ExpireCheck::Rearmed);
        assert_eq!(
            registry.expire(&DeviceId::new("other"), outcome.arming).await,
            ExpireCheck::Gone
        );
        assert!(registry.is_live(&device).await);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_silences_all_watchers() {
        let (registry, mock) = make_registry();

        for i in 0..5 {
            registry.report_alive(DeviceId::new(format!("dev-{}", i)), 100).await;
        }
        assert_eq!(registry.clear().await, 5);

        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;

        assert!(mock.calls().is_empty());
        assert_eq!(registry.watcher_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn notification_failure_leaves_registry_usable() {
        let mock = MockNotifier::failing();
        let registry = TimerRegistry::new(Arc::new(mock.clone()));
        let device = DeviceId::new("abc123");

        registry.report_alive(device.clone(), 100).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;

        assert_eq!(mock.count_for(&device), 1);
        assert!(!registry.is_live(&device).await);

        // Fresh incarnation works as normal
        assert!(registry.report_alive(device.clone(), 100).await.created);
        assert!(registry.is_live(&device).await);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_last_handle_stops_watchers() {
        let (registry, mock) = make_registry();

        registry.report_alive(DeviceId::new("short"), 100).await;
        registry.report_alive(DeviceId::new("long"), 10_000).await;

        let watchers = registry.inner.watchers.clone();
        assert_eq!(watchers.load(Ordering::SeqCst), 2);

        drop(registry);
        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;

        assert!(mock.calls().is_empty());
        assert_eq!(watchers.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_at_the_deadline_keeps_device_live() {
        // The watcher wakes at the old deadline with the reset already
        // queued, and either branch of its select may win
        for i in 0..50 {
            let (registry, mock) = make_registry();
            let device = DeviceId::new(format!("dev-{}", i));

            registry.report_alive(device.clone(), 100).await;
            tokio::time::advance(Duration::from_millis(100)).await;
            assert!(!registry.report_alive(device.clone(), 100).await.created);
            settle().await;

            assert!(registry.is_live(&device).await);
            assert!(mock.calls().is_empty());
            assert_eq!(registry.watcher_count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_rearms_when_reset_lands_after_wake() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        registry.report_alive(device.clone(), 100).await;

        {
            // Hold the lock so the woken watcher queues behind the reset
            let mut entries = registry.inner.entries.lock().await;
            tokio::time::advance(Duration::from_millis(100)).await;
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            let entry = entries.get_mut(&device).unwrap();
            entry.rearm(Instant::now() + Duration::from_millis(200), 200);
        }

        settle().await;
        assert!(registry.is_live(&device).await);
        assert!(mock.calls().is_empty());
        assert_eq!(registry.watcher_count(), 1);

        tokio::time::sleep(Duration::from_millis(250)).await;
        settle().await;
        assert!(!registry.is_live(&device).await);
        assert_eq!(mock.count_for(&device), 1);
        assert_eq!(registry.watcher_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reports_leave_one_entry() {
        let (registry, _mock) = make_registry();
        let device = DeviceId::new("abc123");

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let registry = registry.clone();
                let device = device.clone();
                tokio::spawn(async move { registry.report_alive(device, 60_000 + i).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.watcher_count(), 1);

        // Final timeout is one of the submitted values
        let status = registry.status(&device).await.unwrap();
        assert!((60_000..60_064).contains(&status.timeout_ms));
    }

    #[tokio::test(start_paused = true)]
    async fn keepalive_scenario() {
        let (registry, mock) = make_registry();
        let device = DeviceId::new("abc123");

        assert!(registry.report_alive(device.clone(), 300).await.created);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!registry.report_alive(device.clone(), 300).await.created);

        // 350ms mark
        tokio::time::sleep(Duration::from_millis(250)).await;
        settle().await;
        assert!(registry.is_live(&device).await);

        // 650ms mark
        tokio::time::sleep(Duration::from_millis(300)).await;
        settle().await;
        assert!(!registry.is_live(&device).await);
        assert_eq!(mock.calls(), vec![device]);
    }
}
