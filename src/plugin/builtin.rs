//! In-tree built-in plugins, grounded on the teacher's built-in HTTP
//! interceptors (`LoggingInterceptor`, `HttpTracingInterceptor`).

use super::Plugin;
use crate::error::Error;
use crate::provider::{RawResponse, WireRequest};
use async_trait::async_trait;
use std::time::Instant;
use tokio::sync::Mutex;

/// Emits `tracing` events at each hook; has no effect on the request or
/// response. Useful for diagnosing plugin ordering issues during
/// development.
#[derive(Debug, Default)]
pub struct LoggingPlugin {
    started: Mutex<Option<Instant>>,
}

impl LoggingPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    async fn will_send(&self, request: WireRequest) -> Result<WireRequest, Error> {
        *self.started.lock().await = Some(Instant::now());
        tracing::debug!(method = ?request.method, url = %request.url, "sending request");
        Ok(request)
    }

    async fn did_receive(
        &self,
        response: &RawResponse,
        _data: &[u8],
        request: &WireRequest,
    ) -> Result<(), Error> {
        let elapsed = self
            .started
            .lock()
            .await
            .map(|start| start.elapsed())
            .unwrap_or_default();
        tracing::debug!(
            url = %request.url,
            status = response.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "received response"
        );
        Ok(())
    }

    async fn did_catch(
        &self,
        error: &Error,
        request: &WireRequest,
        _response: Option<&RawResponse>,
    ) -> Option<Error> {
        tracing::warn!(url = %request.url, error = %error, "request failed");
        None
    }
}

/// Appends a fixed set of headers to every outgoing request in `will_send`,
/// demonstrating the mutate-and-forward contract.
#[derive(Debug, Clone)]
pub struct HeaderInjectorPlugin {
    headers: Vec<(String, String)>,
}

impl HeaderInjectorPlugin {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl Plugin for HeaderInjectorPlugin {
    async fn will_send(&self, mut request: WireRequest) -> Result<WireRequest, Error> {
        request.headers.extend(self.headers.iter().cloned());
        Ok(request)
    }
}
