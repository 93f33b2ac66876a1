//! Provider contract (spec §4.6) and the concurrency-gate wrapper (spec §4.5).

mod stub;

pub use stub::{StubProvider, StubResponse};

use crate::error::Error;
use crate::request::Method;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A fully constructed HTTP request, ready for the wire.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

/// Upload-progress notifications, `(bytes_sent, total_bytes)`.
pub type ProgressSink = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Raw transport response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Implemented by transports. The framework only specifies this interface;
/// the generic HTTP executor itself is out of scope (spec §1).
#[async_trait]
pub trait Provider: Send + Sync {
    async fn call(
        &self,
        request: &WireRequest,
        progress: Option<ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RawResponse, Error>;
}

/// A provider wrapper enforcing a bounded number of in-flight requests
/// across the wrapped provider (spec §4.5).
///
/// Built on [`tokio::sync::Semaphore`], which grants permits in FIFO order —
/// the first waiter is the first one released, matching the teacher's
/// semaphore-gated concurrency pattern for bounding concurrent operations.
pub struct ConcurrencyGate {
    inner: Arc<dyn Provider>,
    semaphore: Arc<tokio::sync::Semaphore>,
    max_concurrency: usize,
}

impl ConcurrencyGate {
    /// `max_concurrency <= 0` is clamped to 1 (spec §4.5, §8 scenario 7).
    pub fn new(inner: Arc<dyn Provider>, max_concurrency: i64) -> Self {
        let max = if max_concurrency <= 0 {
            1
        } else {
            max_concurrency as usize
        };
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max)),
            max_concurrency: max,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.semaphore.available_permits()
    }
}

#[async_trait]
impl Provider for ConcurrencyGate {
    async fn call(
        &self,
        request: &WireRequest,
        progress: Option<ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RawResponse, Error> {
        let span = tracing::debug_span!(
            "gate_acquire",
            url = %request.url,
            max_concurrency = self.max_concurrency,
        );
        tracing::debug!(parent: &span, in_flight = self.in_flight(), "waiting for permit");

        // Cancellation here must win the race before the permit is granted:
        // the wrapped provider must never be invoked for a request cancelled
        // while waiting (spec §4.5, §8 scenario 6).
        let acquire = async {
            if let Some(token) = cancel {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("cancelled while waiting for permit");
                        Err(Error::cancelled())
                    }
                    acquired = self.semaphore.clone().acquire_owned() => {
                        Ok(acquired.expect("semaphore is never closed"))
                    }
                }
            } else {
                Ok(self
                    .semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed"))
            }
        };
        let permit = tracing::Instrument::instrument(acquire, span.clone()).await?;
        tracing::debug!(parent: &span, in_flight = self.in_flight(), "permit acquired");

        let result = self.inner.call(request, progress, cancel).await;
        drop(permit);
        tracing::debug!(parent: &span, in_flight = self.in_flight(), "permit released");
        result
    }
}
