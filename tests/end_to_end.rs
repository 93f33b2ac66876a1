//! End-to-end scenarios driving `Request::send` through the full stack:
//! encoding, the plugin pipeline, the retry engine, the concurrency gate and
//! the XPath projector together, rather than each in isolation.

use httpkit_core::provider::{ConcurrencyGate, StubProvider, StubResponse};
use httpkit_core::request::{Method, Request};
use httpkit_core::retry::{FixedCountPolicy, RetryOptions};
use httpkit_core::xpath::{ParseConfig, Projected, TypeTag};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn retries_then_succeeds_and_projects_the_response() {
    let provider = Arc::new(StubProvider::new([
        StubResponse::status(503, "unavailable"),
        StubResponse::ok(r#"{"data":{"id":42,"name":"widget"}}"#),
    ]));

    let request = Request::new("https://example.com/widgets/42", Method::Get)
        .provider(provider)
        .retry(RetryOptions::new(FixedCountPolicy::new(2, 0.0)));

    let configs = vec![
        ParseConfig::required("data/id", TypeTag::Integer),
        ParseConfig::required("data/name", TypeTag::String),
    ];
    let projected = request.parse_response(&configs).await.unwrap();

    assert_eq!(projected.get("data/id"), Some(&Projected::Integer(42)));
    assert_eq!(
        projected.get("data/name"),
        Some(&Projected::String("widget".to_string()))
    );
}

#[tokio::test]
async fn post_with_params_round_trips_through_json_body() {
    let provider = Arc::new(StubProvider::single(StubResponse::ok(r#"{"ok":true}"#)));
    let request = Request::new("https://example.com/widgets", Method::Post)
        .provider(provider)
        .param("name", json!("widget"))
        .param("quantity", json!(3));

    let body: serde_json::Value = request.response().await.unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn response_dict_rejects_non_object_root() {
    let provider = Arc::new(StubProvider::single(StubResponse::ok("[1,2,3]")));
    let request = Request::new("https://example.com/widgets", Method::Get).provider(provider);
    let err = request.response_dict().await.unwrap_err();
    assert_eq!(err.code(), Some(httpkit_core::error::CODE_RESPONSE_DECODING));
}

#[tokio::test]
async fn concurrency_gate_serializes_requests_through_the_wrapped_provider() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingProvider {
        in_flight: Arc<AtomicUsize>,
        max_observed: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl httpkit_core::provider::Provider for CountingProvider {
        async fn call(
            &self,
            _request: &httpkit_core::provider::WireRequest,
            _progress: Option<httpkit_core::provider::ProgressSink>,
            _cancel: Option<&tokio_util::sync::CancellationToken>,
        ) -> Result<httpkit_core::provider::RawResponse, httpkit_core::Error> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_observed.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(httpkit_core::provider::RawResponse {
                status: 200,
                headers: vec![],
                body: b"{}".to_vec(),
            })
        }
    }

    let max_observed = Arc::new(AtomicUsize::new(0));
    let inner = Arc::new(CountingProvider {
        in_flight: Arc::new(AtomicUsize::new(0)),
        max_observed: max_observed.clone(),
    });
    let gate = Arc::new(ConcurrencyGate::new(inner, 1));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let gate = gate.clone();
        let request = Request::new("https://example.com", Method::Get).provider(gate);
        handles.push(tokio::spawn(async move { request.send().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(max_observed.load(Ordering::SeqCst), 1);
}
