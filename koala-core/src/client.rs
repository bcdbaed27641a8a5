//! HTTP backend for a Koala endpoint
//!
//! Each event is sent as its own `POST <endpoint>/track` request with the
//! JSON body `{"event": ..., "properties": {...}}`. There is no batching and
//! no retry; a failed request is logged and dropped.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use crate::backend::TrackingBackend;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{Event, Properties};

/// Sends events to a Koala endpoint over HTTP
///
/// Requests run on a private current-thread runtime, so [`send`](Self::send)
/// and [`TrackingBackend::track`] block the calling thread until the endpoint
/// answers or the timeout expires. Both are safe to call from async code:
/// - on a multi-thread tokio runtime the wait happens inside
///   [`tokio::task::block_in_place`]
/// - on a current-thread runtime the request is driven from a scoped helper
///   thread, since that runtime's only worker cannot be handed off
///
/// Dropping the client never blocks, so it may also be dropped inside async code.
pub struct KoalaClient {
    http_client: reqwest::Client,
    track_url: String,
    /// Always `Some` until drop
    runtime: Option<Runtime>,
}

impl KoalaClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if !config.enabled {
            return Err(Error::Config("client is disabled".to_string()));
        }
        config.validate()?;

        let base_url = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("client.endpoint is required".to_string()))?
            .trim_end_matches('/');

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Client(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            http_client,
            track_url: format!("{}/track", base_url),
            runtime: Some(runtime),
        })
    }

    /// URL events are posted to
    pub fn track_url(&self) -> &str {
        &self.track_url
    }

    /// Send a single event, blocking until the endpoint answers
    pub fn send(&self, event: &Event) -> Result<()> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| Error::Client("client runtime is shut down".to_string()))?;

        let Ok(handle) = Handle::try_current() else {
            return runtime.block_on(self.send_async(event));
        };

        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| runtime.block_on(self.send_async(event)))
            }
            _ => std::thread::scope(|scope| {
                scope
                    .spawn(|| runtime.block_on(self.send_async(event)))
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            }),
        }
    }

    async fn send_async(&self, event: &Event) -> Result<()> {
        let response = self
            .http_client
            .post(&self.track_url)
            .json(event)
            .send()
            .await
            .map_err(|e| Error::Client(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        Err(Error::Client(format!("API error ({}): {}", status, error_text)))
    }
}

impl Drop for KoalaClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl TrackingBackend for KoalaClient {
    fn track(&self, event: &str, properties: &Properties) {
        let event = Event::new(event, properties.clone());

        match self.send(&event) {
            Ok(()) => tracing::debug!(event = %event.name, "Sent event to Koala"),
            Err(e) => tracing::warn!(
                event = %event.name,
                error = %e,
                "Failed to send event to Koala"
            ),
        }
    }
}
