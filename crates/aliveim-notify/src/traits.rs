//! Notifier trait

use aliveim_util::DeviceId;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream rejected notification with status {status}")]
    Status { status: u16 },

    #[error("Invalid notifier configuration: {0}")]
    InvalidConfig(String),

    #[error("Notification failed: {0}")]
    Failed(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Outbound collaborator told about every expired device.
///
/// Implementations own retry, timeout and auth policy. Callers treat a
/// failure as final and only log it.
#[async_trait]
pub trait ExpiryNotifier: Send + Sync {
    async fn notify_expired(&self, device_id: &DeviceId) -> NotifyResult<()>;
}
