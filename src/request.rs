//! Request descriptor and its fluent builder contract (spec §4.1).
//!
//! Every "chain operation" below returns a new [`Request`] value with the
//! change applied — there is no reference-mutation path, matching the
//! structural-update approach the design notes call for (spec §9): callers
//! never observe a half-updated descriptor, and a descriptor handed to
//! [`Request::send`] is never mutated by the sender.

use crate::encoding::{self, Encoding};
use crate::error::Error;
use crate::params::{ParamItem, Parameters};
use crate::plugin::{self, Plugin};
use crate::provider::{Provider, ProgressSink, WireRequest};
use crate::retry::RetryOptions;
use crate::xpath::{ParseConfig, Projected};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl Method {
    /// GET/HEAD/DELETE default to URL-query, everything else to JSON-body
    /// (spec §3).
    pub fn default_encoding(self) -> Encoding {
        match self {
            Method::Get | Method::Head | Method::Delete => Encoding::UrlQuery,
            Method::Post | Method::Put | Method::Patch => Encoding::JsonBody,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
        }
    }
}

/// The immutable-after-build request descriptor (spec §3, glossary
/// "Descriptor"). Builder operations return a new `Request`; the descriptor
/// holds a non-owning `Arc<dyn Provider>` handle (spec §9: the provider
/// outlives the request, no cyclic ownership is needed).
#[derive(Clone)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub parameters: Parameters,
    pub encoding: Option<Encoding>,
    pub timeout: Duration,
    pub retry: Option<RetryOptions>,
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub provider: Option<Arc<dyn Provider>>,
}

impl Request {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            parameters: Parameters::None,
            encoding: None,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS),
            retry: None,
            plugins: Vec::new(),
            provider: None,
        }
    }

    /// Equivalent to `Request::new(url, method).provider(provider)`; the
    /// three-argument entry point spec §4.1 names alongside
    /// [`crate::config::ClientConfig::request`].
    pub fn with_provider(url: impl Into<String>, method: Method, provider: Arc<dyn Provider>) -> Self {
        Self::new(url, method).provider(provider)
    }

    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Append a single scalar parameter. Replaces any previously installed
    /// typed-parameter set (spec §4.1) — callers mixing typed and untyped
    /// parameters on the same descriptor get the untyped set, loudly logged
    /// so the replacement is not a silent surprise.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ensure_items_parameters();
        if let Parameters::Items(items) = &mut self.parameters {
            items.push(ParamItem::scalar(name, value));
        }
        self
    }

    pub fn params(mut self, items: impl IntoIterator<Item = ParamItem>) -> Self {
        self.ensure_items_parameters();
        if let Parameters::Items(existing) = &mut self.parameters {
            existing.extend(items);
        }
        self
    }

    pub fn params_dict(self, dict: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.params(dict.into_iter().map(|(k, v)| ParamItem::Scalar(k, v)))
    }

    /// Install a typed-parameter set (spec §3 "typed parameter capability").
    pub fn typed_params(mut self, items: Vec<Arc<dyn crate::params::TypedParameter>>) -> Self {
        self.parameters = Parameters::Typed(items);
        self
    }

    fn ensure_items_parameters(&mut self) {
        if let Parameters::Typed(_) = &self.parameters {
            tracing::warn!(
                "appending untyped parameters replaces a previously installed typed-parameter set"
            );
            self.parameters = Parameters::Items(Vec::new());
        } else if let Parameters::None = &self.parameters {
            self.parameters = Parameters::Items(Vec::new());
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(pairs);
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Values <= 0 are clamped to the default 30s (spec §4.1, §8).
    pub fn timeout(mut self, seconds: f64) -> Self {
        self.timeout = if seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS)
        };
        self
    }

    /// Installs a retry policy for this request, overriding any
    /// provider-/config-level default (spec §4.4).
    pub fn retry(mut self, options: RetryOptions) -> Self {
        self.retry = Some(options);
        self
    }

    /// Replaces the plugin chain wholesale.
    pub fn plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    /// GET/HEAD bodies are forbidden (spec §4.2) — those methods always use
    /// the query encoder, even if the caller overrode the encoding.
    fn effective_encoding(&self) -> Encoding {
        if matches!(self.method, Method::Get | Method::Head) {
            return Encoding::UrlQuery;
        }
        self.encoding.unwrap_or_else(|| self.method.default_encoding())
    }

    /// Build the wire-level request: validate the URL, encode parameters,
    /// and set `Content-Type` for JSON bodies unless the caller already set
    /// it (spec §4.2).
    fn build_wire_request(&self) -> Result<WireRequest, Error> {
        let parsed = url::Url::parse(&self.url).map_err(|e| Error::invalid_url(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::invalid_url(format!(
                "`{}` is not an absolute URL",
                self.url
            )));
        }

        if !self.parameters.validate_typed() {
            return Err(Error::construction(
                "one or more typed parameters failed validation against the full parameter set",
            ));
        }

        let items = self.parameters.as_items();
        let mut headers = self.headers.clone();
        let mut url = self.url.clone();
        let mut body = None;

        match self.effective_encoding() {
            Encoding::UrlQuery => {
                if !items.is_empty() {
                    let query = encoding::query::encode(&items)?;
                    let separator = if url.contains('?') { '&' } else { '?' };
                    url = format!("{url}{separator}{query}");
                }
            }
            Encoding::JsonBody => {
                if !items.is_empty() {
                    body = Some(encoding::json_body::encode_bytes(&items)?);
                    let has_content_type = headers
                        .iter()
                        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
                    if !has_content_type {
                        headers.push((
                            "Content-Type".to_string(),
                            "application/json; charset=utf-8".to_string(),
                        ));
                    }
                }
            }
        }

        Ok(WireRequest {
            url,
            method: self.method,
            headers,
            body,
            timeout: self.timeout,
        })
    }

    fn effective_retry(&self) -> Option<Arc<dyn crate::retry::RetryPolicy>> {
        self.retry.as_ref().map(|opts| opts.policy.clone())
    }

    /// Run one logical send: retry engine loops attempts, each attempt runs
    /// the plugin pipeline around the (possibly gate-wrapped) provider.
    /// Returns raw response bytes after the final `process` stage (spec
    /// §4.1, §4.8).
    pub async fn send(&self) -> Result<Vec<u8>, Error> {
        self.send_with(None, None).await
    }

    pub async fn send_cancellable(&self, cancel: &CancellationToken) -> Result<Vec<u8>, Error> {
        self.send_with(None, Some(cancel)).await
    }

    pub async fn send_with(
        &self,
        progress: Option<ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<u8>, Error> {
        tracing::debug!(url = %self.url, method = ?self.method, "send");
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| Error::construction("no provider configured for this request"))?;
        let wire_request = self.build_wire_request()?;
        let policy = self.effective_retry();
        let plugins = self.plugins.clone();

        crate::retry::run(self, policy.as_ref(), cancel, move |_attempt| {
            let wire_request = wire_request.clone();
            let provider = provider.clone();
            let plugins = plugins.clone();
            let progress = progress.clone();
            async move {
                plugin::run_attempt(&plugins, wire_request, provider.as_ref(), progress, cancel)
                    .await
            }
        })
        .await
    }

    /// Decode bytes to `T` (spec §4.8); decode failure -> `80000004`.
    pub async fn response<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let bytes = self.send().await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::decoding(e.to_string()))
    }

    /// Decode the top-level JSON object as a string -> value map; if the
    /// root is not an object, `80000004`.
    pub async fn response_dict(&self) -> Result<HashMap<String, Value>, Error> {
        let bytes = self.send().await?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::decoding(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(Error::decoding(format!(
                "expected a JSON object at the response root, found {other:?}"
            ))),
        }
    }

    /// Decode the top-level JSON array of objects; if elements are not
    /// objects, `80000004`.
    pub async fn response_array(&self) -> Result<Vec<HashMap<String, Value>>, Error> {
        let bytes = self.send().await?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::decoding(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(Error::decoding("expected a JSON array at the response root"));
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map.into_iter().collect()),
                other => Err(Error::decoding(format!(
                    "expected array elements to be objects, found {other:?}"
                ))),
            })
            .collect()
    }

    /// Decode to generic JSON and run the XPath projections (spec §4.7).
    pub async fn parse_response(
        &self,
        configs: &[ParseConfig],
    ) -> Result<HashMap<String, Projected>, Error> {
        let bytes = self.send().await?;
        let root: Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::decoding(e.to_string()))?;
        crate::xpath::parse_response(&root, configs)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("encoding", &self.encoding)
            .field("timeout", &self.timeout)
            .field("plugin_count", &self.plugins.len())
            .finish_non_exhaustive()
    }
}
