//! Validated service configuration

use crate::schema::{RawConfig, RawNotifySection, RawServiceSection};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_API_URL: &str = "http://localhost";
pub const DEFAULT_API_TOKEN: &str = "aabbccdd";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Validated configuration ready for use by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceConfig {
    pub listen: ListenConfig,
    pub notify: NotifyConfig,
}

impl ServiceConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            listen: ListenConfig::from_raw(raw.service),
            notify: NotifyConfig::from_raw(raw.notify),
        }
    }
}

/// Where the alive endpoint listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl ListenConfig {
    fn from_raw(raw: RawServiceSection) -> Self {
        Self {
            host: raw.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: raw.port.unwrap_or(DEFAULT_PORT),
        }
    }

    /// `host:port` string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceSection::default())
    }
}

/// Where and how expiry notices are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub api_url: String,
    pub api_token: String,
    pub request_timeout: Duration,
}

impl NotifyConfig {
    fn from_raw(raw: RawNotifySection) -> Self {
        Self {
            api_url: raw.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: raw.api_token.unwrap_or_else(|| DEFAULT_API_TOKEN.to_string()),
            request_timeout: raw
                .request_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self::from_raw(RawNotifySection::default())
    }
}
