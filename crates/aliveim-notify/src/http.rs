//! HTTP notifier posting expiry notices to the upstream API

use aliveim_api::ExpiredNotice;
use aliveim_config::NotifyConfig;
use aliveim_util::DeviceId;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use crate::{ExpiryNotifier, NotifyError, NotifyResult};

/// Sends `POST <api_url>` with `{"device_id": ...}` and a token header
pub struct HttpNotifier {
    client: Client,
    api_url: String,
    auth_header: String,
}

impl HttpNotifier {
    pub fn new(
        api_url: impl Into<String>,
        api_token: &str,
        request_timeout: Duration,
    ) -> NotifyResult<Self> {
        let api_url = api_url.into();
        if api_url.is_empty() {
            return Err(NotifyError::InvalidConfig("api_url is empty".into()));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url,
            auth_header: format!("Token {}", api_token),
        })
    }

    pub fn from_config(config: &NotifyConfig) -> NotifyResult<Self> {
        Self::new(
            config.api_url.clone(),
            &config.api_token,
            config.request_timeout,
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl ExpiryNotifier for HttpNotifier {
    async fn notify_expired(&self, device_id: &DeviceId) -> NotifyResult<()> {
        let notice = ExpiredNotice {
            device_id: device_id.clone(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "application/json")
            .json(&notice)
            .send()
            .await?;

        let status = response.status();
        debug!(device_id = %device_id, status = status.as_u16(), "Upstream responded");

        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                status: status.as_u16(),
            })
        }
    }
}
