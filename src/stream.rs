//! Single-value stream adapter (spec §4.1, §9): a cold stream that performs
//! no work until subscribed, triggers exactly one `send()` per subscription,
//! and cancels the in-flight attempt if the subscriber drops the stream
//! before it completes. Every `subscribe()` call starts an independent,
//! freshly-triggered send — nothing is shared or replayed across
//! subscriptions.

use crate::error::Error;
use crate::request::Request;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// Wraps a [`Request`] so it can be subscribed to repeatedly, each time as
/// an independent one-shot send.
#[derive(Clone)]
pub struct RequestStream {
    request: Request,
}

impl RequestStream {
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    /// Spawn a fresh send and return a stream that yields its single result.
    /// Dropping the returned stream before it yields cancels the attempt.
    pub fn subscribe(&self) -> SingleValueStream {
        let request = self.request.clone();
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        let (tx, rx) = tokio::sync::mpsc::channel(1);

        tokio::spawn(async move {
            let result = request.send_cancellable(&cancel_for_task).await;
            let _ = tx.send(result).await;
        });

        SingleValueStream {
            inner: ReceiverStream::new(rx),
            cancel,
        }
    }
}

/// A cold, single-value stream. Polling before the send completes yields
/// `Poll::Pending`; after it completes the one `Result` is yielded and the
/// stream ends. Dropping it early cancels the underlying send.
pub struct SingleValueStream {
    inner: ReceiverStream<Result<Vec<u8>, Error>>,
    cancel: CancellationToken,
}

impl Stream for SingleValueStream {
    type Item = Result<Vec<u8>, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for SingleValueStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StubProvider, StubResponse};
    use crate::request::Method;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn subscribe_yields_exactly_one_item() {
        let provider = Arc::new(StubProvider::single(StubResponse::ok("done")));
        let request = Request::new("https://example.com", Method::Get).provider(provider);
        let stream = RequestStream::new(request);

        let mut sub = stream.subscribe();
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first, b"done");
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn each_subscription_triggers_an_independent_send() {
        let provider = Arc::new(StubProvider::single(StubResponse::ok("done")));
        let request = Request::new("https://example.com", Method::Get).provider(provider);
        let stream = RequestStream::new(request);

        let first = stream.subscribe().next().await.unwrap().unwrap();
        let second = stream.subscribe().next().await.unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn dropping_before_completion_cancels_the_send() {
        let provider = Arc::new(StubProvider::single(
            StubResponse::ok("done").with_delay(Duration::from_millis(200)),
        ));
        let request = Request::new("https://example.com", Method::Get).provider(provider);
        let stream = RequestStream::new(request);

        let sub = stream.subscribe();
        drop(sub);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
