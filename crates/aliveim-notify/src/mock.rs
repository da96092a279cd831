//! Mock notifier for testing

use aliveim_util::DeviceId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::{ExpiryNotifier, NotifyError, NotifyResult};

/// Records every expiry it is told about
#[derive(Clone, Default)]
pub struct MockNotifier {
    calls: Arc<Mutex<Vec<DeviceId>>>,
    signal: Arc<Notify>,

    /// Configure delivery to fail (calls are still recorded)
    pub fail: Arc<AtomicBool>,

    /// Delay before each delivery completes
    pub delay: Arc<Mutex<Option<Duration>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        mock.set_fail(true);
        mock
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// All notified device IDs, in call order
    pub fn calls(&self) -> Vec<DeviceId> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of notifications for one device
    pub fn count_for(&self, device_id: &DeviceId) -> usize {
        self.calls().iter().filter(|d| *d == device_id).count()
    }

    /// Wait until at least `n` notifications have been recorded
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.signal.notified();
            if self.calls().len() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl ExpiryNotifier for MockNotifier {
    async fn notify_expired(&self, device_id: &DeviceId) -> NotifyResult<()> {
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(device_id.clone());
        self.signal.notify_waiters();

        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Failed("Mock notification failure".into()));
        }
        Ok(())
    }
}
