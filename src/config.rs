//! Crate-level defaults (spec §3 "added" ambient-stack section), grounded
//! on the teacher's `BuilderBase`/`ProviderCore` split: a shared config
//! object seeds every descriptor it mints so callers don't repeat
//! `.header(...)`/`.retry(...)` on each request.

use crate::plugin::Plugin;
use crate::provider::Provider;
use crate::request::{Method, Request, DEFAULT_TIMEOUT_SECONDS};
use crate::retry::RetryOptions;
use std::sync::Arc;

/// Defaults applied to every descriptor minted by [`ClientConfig::request`].
/// A descriptor can still override any of these per-call; nothing here is
/// sticky once `.request()` has handed back a [`Request`].
#[derive(Clone)]
pub struct ClientConfig {
    default_headers: Vec<(String, String)>,
    default_timeout_seconds: f64,
    default_retry: Option<RetryOptions>,
    default_plugins: Vec<Arc<dyn Plugin>>,
    default_provider: Option<Arc<dyn Provider>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_headers: Vec::new(),
            default_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            default_retry: None,
            default_plugins: Vec::new(),
            default_provider: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.default_provider = Some(provider);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, seconds: f64) -> Self {
        self.default_timeout_seconds = if seconds > 0.0 {
            seconds
        } else {
            DEFAULT_TIMEOUT_SECONDS
        };
        self
    }

    pub fn retry(mut self, options: RetryOptions) -> Self {
        self.default_retry = Some(options);
        self
    }

    pub fn plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.default_plugins = plugins;
        self
    }

    /// Mint a new descriptor seeded with this config's defaults. A
    /// request-level `.retry(...)`/`.header(...)`/... call still takes
    /// precedence over what's installed here (spec §4.4 for retry; the
    /// same override-wins rule extends to headers, timeout and plugins).
    pub fn request(&self, url: impl Into<String>, method: Method) -> Request {
        let mut request = Request::new(url, method)
            .headers(self.default_headers.clone())
            .plugins(self.default_plugins.clone())
            .timeout(self.default_timeout_seconds);

        if let Some(provider) = &self.default_provider {
            request = request.provider(provider.clone());
        }
        if let Some(retry) = &self.default_retry {
            request = request.retry(retry.clone());
        }
        request
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("default_headers", &self.default_headers)
            .field("default_timeout_seconds", &self.default_timeout_seconds)
            .field("has_default_retry", &self.default_retry.is_some())
            .field("default_plugin_count", &self.default_plugins.len())
            .field("has_default_provider", &self.default_provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StubProvider, StubResponse};

    #[tokio::test]
    async fn request_inherits_config_defaults() {
        let provider = Arc::new(StubProvider::single(StubResponse::ok("{}")));
        let config = ClientConfig::new()
            .provider(provider)
            .header("x-api-key", "secret")
            .timeout(5.0);
        let request = config.request("https://example.com/widgets", Method::Get);
        assert_eq!(
            request.headers,
            vec![("x-api-key".to_string(), "secret".to_string())]
        );
        assert_eq!(request.timeout, std::time::Duration::from_secs_f64(5.0));
        assert!(request.provider.is_some());
    }

    #[tokio::test]
    async fn request_level_retry_overrides_config_default() {
        use crate::retry::FixedCountPolicy;
        let config_policy = RetryOptions::new(FixedCountPolicy::new(1, 0.0));
        let request_policy = RetryOptions::new(FixedCountPolicy::new(9, 0.0));
        let config = ClientConfig::new().retry(config_policy);
        let request = config
            .request("https://example.com", Method::Get)
            .retry(request_policy);
        assert!(request.retry.is_some());
    }
}
