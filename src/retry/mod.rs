//! Retry engine (spec §4.4).

mod policy;

pub use policy::{ConditionalPolicy, ExponentialBackoffPolicy, FixedCountPolicy, RetryPolicy};

use crate::error::Error;
use crate::request::Request;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A policy bundled with caller intent, mirroring how a provider-level
/// default and a request-level override are both just an `Option<RetryOptions>`
/// that either carries a policy or doesn't.
#[derive(Clone)]
pub struct RetryOptions {
    pub policy: Arc<dyn RetryPolicy>,
    /// Documents that the request is safe to retry without side effects;
    /// the engine does not gate on this (spec scopes automatic idempotency
    /// gating out), it is informational for callers composing policies.
    pub idempotent: bool,
}

impl RetryOptions {
    pub fn new(policy: impl RetryPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
            idempotent: true,
        }
    }

    pub fn with_idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    /// The explicit spelling of "no retry policy installed" — a single
    /// attempt is made. Equivalent to leaving [`Request::retry`](crate::request::Request::retry)
    /// uncalled; exists so callers can say what they mean instead of relying
    /// on the absence of a call.
    pub fn none() -> Option<Self> {
        None
    }
}

impl std::fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOptions")
            .field("idempotent", &self.idempotent)
            .finish_non_exhaustive()
    }
}

/// Run `attempt` (one plugin-pipeline + provider execution) under `policy`,
/// looping per spec §4.4:
///
/// 1. run the attempt
/// 2. success -> return
/// 3. non-retryable (cancellation, invalid URL, or policy says no) -> propagate
/// 4. compute delay; non-finite -> error `80000007`; negative clamped to 0
/// 5. sleep, bump attempt, go to 1
///
/// Absent a policy, a single attempt is made (request-level policy overrides
/// a provider-level one; the caller resolves that before calling in).
pub async fn run<F, Fut, T>(
    request: &Request,
    policy: Option<&Arc<dyn RetryPolicy>>,
    cancel: Option<&CancellationToken>,
    mut attempt: F,
) -> Result<T, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt_no: u32 = 1;
    loop {
        let span = tracing::debug_span!("attempt", attempt = attempt_no, url = %request.url, method = ?request.method);
        let result = tracing::Instrument::instrument(attempt(attempt_no), span).await;
        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let Some(policy) = policy else {
            return Err(error);
        };
        if error.is_engine_terminal() {
            return Err(error);
        }
        if !policy.should_retry(request, &error, attempt_no).await {
            return Err(error);
        }

        let raw_delay = policy.delay(attempt_no).await;
        if !raw_delay.is_finite() {
            tracing::warn!(attempt = attempt_no, delay = raw_delay, "retry policy returned a non-finite delay");
            return Err(Error::invalid_retry_delay(format!(
                "retry policy returned a non-finite delay: {raw_delay}"
            )));
        }
        let delay = Duration::from_secs_f64(raw_delay.max(0.0));
        tracing::debug!(attempt = attempt_no, delay_seconds = delay.as_secs_f64(), "retrying after delay");

        if let Some(token) = cancel {
            tokio::select! {
                _ = token.cancelled() => return Err(Error::cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }
        } else {
            tokio::time::sleep(delay).await;
        }

        attempt_no += 1;
    }
}
