//! Retry policy contract and the three bundled policies (spec §4.4).

use crate::error::Error;
use crate::request::Request;
use async_trait::async_trait;

/// A retry policy gates and paces retries for one logical send.
///
/// `attempt` is 1-based and is the attempt that just failed. `delay` returns
/// seconds rather than a `Duration` because a misbehaving policy may return
/// a non-finite value (NaN or +/-infinity); the engine turns that into error
/// `80000007` rather than panicking on an invalid `Duration`.
#[async_trait]
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    async fn should_retry(&self, request: &Request, error: &Error, attempt: u32) -> bool;
    async fn delay(&self, attempt: u32) -> f64;
}

/// Retries up to `max_retries` times with a constant delay.
#[derive(Debug, Clone, Copy)]
pub struct FixedCountPolicy {
    pub max_retries: u32,
    pub delay_seconds: f64,
}

impl FixedCountPolicy {
    pub fn new(max_retries: u32, delay_seconds: f64) -> Self {
        Self {
            max_retries,
            delay_seconds,
        }
    }
}

#[async_trait]
impl RetryPolicy for FixedCountPolicy {
    async fn should_retry(&self, _request: &Request, _error: &Error, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    async fn delay(&self, _attempt: u32) -> f64 {
        self.delay_seconds
    }
}

/// Attempt `K` triggers delay `base * factor^(K-1)`, capped at `max_delay`;
/// retries up to `max_retries` times.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoffPolicy {
    pub max_retries: u32,
    pub base_seconds: f64,
    pub factor: f64,
    pub max_delay_seconds: f64,
}

impl ExponentialBackoffPolicy {
    pub fn new(max_retries: u32, base_seconds: f64, factor: f64, max_delay_seconds: f64) -> Self {
        Self {
            max_retries,
            base_seconds,
            factor,
            max_delay_seconds,
        }
    }
}

#[async_trait]
impl RetryPolicy for ExponentialBackoffPolicy {
    async fn should_retry(&self, _request: &Request, _error: &Error, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    async fn delay(&self, attempt: u32) -> f64 {
        let raw = self.base_seconds * self.factor.powi(attempt as i32 - 1);
        if raw.is_finite() {
            raw.min(self.max_delay_seconds)
        } else {
            raw
        }
    }
}

type ShouldRetryFn = dyn Fn(&Request, &Error, u32) -> bool + Send + Sync;
type DelayFn = dyn Fn(u32) -> f64 + Send + Sync;

/// Delegates both decisions to caller-supplied closures.
pub struct ConditionalPolicy {
    should_retry: Box<ShouldRetryFn>,
    delay: Box<DelayFn>,
}

impl ConditionalPolicy {
    pub fn new(
        should_retry: impl Fn(&Request, &Error, u32) -> bool + Send + Sync + 'static,
        delay: impl Fn(u32) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            should_retry: Box::new(should_retry),
            delay: Box::new(delay),
        }
    }
}

impl std::fmt::Debug for ConditionalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalPolicy").finish_non_exhaustive()
    }
}

#[async_trait]
impl RetryPolicy for ConditionalPolicy {
    async fn should_retry(&self, request: &Request, error: &Error, attempt: u32) -> bool {
        (self.should_retry)(request, error, attempt)
    }

    async fn delay(&self, attempt: u32) -> f64 {
        (self.delay)(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Method, Request};

    fn dummy_request() -> Request {
        Request::new("https://example.com", Method::Get)
    }

    #[tokio::test]
    async fn fixed_count_retries_up_to_limit() {
        let policy = FixedCountPolicy::new(2, 0.01);
        let req = dummy_request();
        let err = Error::http(500, "boom", crate::error::ResponseMeta {
            status: 500,
            headers: vec![],
            body: vec![],
        });
        assert!(policy.should_retry(&req, &err, 1).await);
        assert!(policy.should_retry(&req, &err, 2).await);
        assert!(!policy.should_retry(&req, &err, 3).await);
    }

    #[tokio::test]
    async fn exponential_backoff_grows_and_caps() {
        let policy = ExponentialBackoffPolicy::new(5, 1.0, 2.0, 4.0);
        assert_eq!(policy.delay(1).await, 1.0);
        assert_eq!(policy.delay(2).await, 2.0);
        assert_eq!(policy.delay(3).await, 4.0);
        assert_eq!(policy.delay(4).await, 4.0); // capped
    }
}
