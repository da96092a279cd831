//! Shared types for the aliveim API

use aliveim_util::DeviceId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Keepalive report sent by a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveRequest {
    pub device_id: DeviceId,
    /// Requested timeout in milliseconds
    pub timeout: i32,
}

/// What a report did to the device's timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliveStatus {
    /// No timer existed; a new one was armed
    Created,
    /// An existing timer had its deadline pushed out
    Reset,
}

impl AliveStatus {
    pub fn from_created(created: bool) -> Self {
        if created { Self::Created } else { Self::Reset }
    }
}

/// Response body for an accepted report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveResponse {
    pub device_id: DeviceId,
    pub status: AliveStatus,
}

/// Snapshot of a live device timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: DeviceId,
    /// Timeout requested by the most recent report
    pub timeout_ms: i32,
    /// Time left before the device expires
    pub remaining_ms: u64,
    /// Wall-clock time of the most recent report
    pub reported_at: DateTime<Local>,
}

/// Body posted upstream when a device expires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredNotice {
    pub device_id: DeviceId,
}

/// Service health
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub live_devices: usize,
    pub api_version: u32,
    pub version: String,
}
