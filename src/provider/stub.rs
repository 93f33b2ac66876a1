//! A canned-response provider for tests (spec §4.6 "test/stub provider"),
//! grounded on the teacher's use of HTTP test doubles in its own test suite
//! but expressed in-tree so this crate's tests have no network dependency.

use super::{Provider, RawResponse, WireRequest};
use crate::error::{Error, ResponseMeta};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One scripted response (or failure) for a single call.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
    pub delay: Duration,
}

impl StubResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: vec![],
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: vec![],
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replays a queue of scripted [`StubResponse`]s, one per call; once
/// exhausted the last response is repeated.
pub struct StubProvider {
    queue: Mutex<VecDeque<StubResponse>>,
    last: Mutex<Option<StubResponse>>,
}

impl StubProvider {
    pub fn new(responses: impl IntoIterator<Item = StubResponse>) -> Self {
        Self {
            queue: Mutex::new(responses.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    pub fn single(response: StubResponse) -> Self {
        Self::new([response])
    }

    fn next_response(&self) -> StubResponse {
        let mut queue = self.queue.lock().expect("stub queue mutex poisoned");
        if let Some(next) = queue.pop_front() {
            *self.last.lock().expect("stub last mutex poisoned") = Some(next.clone());
            next
        } else {
            self.last
                .lock()
                .expect("stub last mutex poisoned")
                .clone()
                .expect("StubProvider called with an empty response queue and no prior response")
        }
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn call(
        &self,
        _request: &WireRequest,
        _progress: Option<super::ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RawResponse, Error> {
        let response = self.next_response();
        if !response.delay.is_zero() {
            if let Some(token) = cancel {
                tokio::select! {
                    _ = token.cancelled() => return Err(Error::cancelled()),
                    _ = tokio::time::sleep(response.delay) => {}
                }
            } else {
                tokio::time::sleep(response.delay).await;
            }
        }

        if response.status >= 400 {
            return Err(Error::http(
                response.status,
                String::from_utf8_lossy(&response.body).into_owned(),
                ResponseMeta {
                    status: response.status,
                    headers: response.headers.clone(),
                    body: response.body.clone(),
                },
            ));
        }

        Ok(RawResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}
