//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Listener for alive reports
    #[serde(default)]
    pub service: RawServiceSection,

    /// Upstream API that receives expiry notices
    #[serde(default)]
    pub notify: RawNotifySection,
}

/// Listener settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceSection {
    /// Bind host (default: localhost)
    pub host: Option<String>,

    /// Bind port (default: 5000)
    pub port: Option<u16>,
}

/// Upstream notification settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNotifySection {
    /// URL that expiry notices are POSTed to
    pub api_url: Option<String>,

    /// Token sent as `Authorization: Token <api_token>`
    pub api_token: Option<String>,

    /// Per-request timeout for the notification call
    pub request_timeout_ms: Option<u64>,
}
