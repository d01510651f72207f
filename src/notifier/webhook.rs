//! Build hook client.
//!
//! [`HttpBuildHook`] sends a bodiless HTTP POST to the configured build hook
//! URL. There is no retry: a failed call is reported to the caller, which
//! logs it and moves on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::store::ChangeEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for build hook calls.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Build hook returned HTTP {0}")]
    HttpStatus(u16),
}

impl WebhookError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WebhookError::Request(e) if e.is_timeout())
    }
}

// ---------------------------------------------------------------------------
// BuildHook
// ---------------------------------------------------------------------------

/// Something that can be triggered once per store change.
#[async_trait]
pub trait BuildHook: Send + Sync {
    /// Trigger a build for `event`, returning the success status code.
    async fn trigger(&self, event: &ChangeEvent) -> Result<u16, WebhookError>;

    /// Where calls go, for log fields.
    fn target(&self) -> &str;
}

// ---------------------------------------------------------------------------
// HttpBuildHook
// ---------------------------------------------------------------------------

/// Calls a build hook endpoint over HTTP.
pub struct HttpBuildHook {
    client: reqwest::Client,
    url: Url,
}

impl HttpBuildHook {
    /// Create a hook client whose calls give up after `timeout`.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl BuildHook for HttpBuildHook {
    /// POST with no body. The event only shows up in logs, the hook
    /// endpoint never sees it.
    async fn trigger(&self, _event: &ChangeEvent) -> Result<u16, WebhookError> {
        let response = self.client.post(self.url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }

        Ok(status.as_u16())
    }

    fn target(&self) -> &str {
        self.url.as_str()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
