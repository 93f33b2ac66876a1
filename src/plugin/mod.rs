//! Four-phase plugin (middleware) pipeline (spec §4.3).
//!
//! Hooks default to no-ops/pass-through so a plugin only needs to implement
//! the phases it cares about, mirroring how the teacher's
//! `execution::middleware` traits provide default method bodies.

pub mod builtin;

use crate::error::Error;
use crate::provider::{Provider, ProgressSink, RawResponse, WireRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A pipeline middleware. All four hooks are asynchronous and fallible.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// May mutate the request (headers, body). Called in declaration order
    /// before the provider call.
    async fn will_send(&self, request: WireRequest) -> Result<WireRequest, Error> {
        Ok(request)
    }

    /// Called in declaration order when the provider returned a response
    /// without throwing.
    async fn did_receive(
        &self,
        _response: &RawResponse,
        _data: &[u8],
        _request: &WireRequest,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Data-transformation stage, called after all `did_receive` completed
    /// successfully, in declaration order; output of plugin N is the input
    /// to plugin N+1.
    async fn process(
        &self,
        data: Vec<u8>,
        _response: &RawResponse,
        _request: &WireRequest,
    ) -> Result<Vec<u8>, Error> {
        Ok(data)
    }

    /// Called in declaration order when the provider or any earlier plugin
    /// hook threw. Returning `Some(error)` substitutes it for the error
    /// subsequent plugins observe and the attempt ultimately fails with;
    /// returning `None` leaves the current error unchanged ("swallows" in
    /// the sense that this plugin raised no objection — propagation still
    /// resumes the original/current error per spec §4.3).
    ///
    /// Every plugin's `did_catch` is invoked regardless of whether its own
    /// `will_send`/`did_receive` ran for this attempt — the design-notes
    /// open question (spec §9) is resolved this way.
    async fn did_catch(
        &self,
        _error: &Error,
        _request: &WireRequest,
        _response: Option<&RawResponse>,
    ) -> Option<Error> {
        None
    }
}

/// Run one attempt (will_send -> provider -> did_receive -> process) through
/// `plugins`, in declaration order, per the pipeline contract in spec §4.3.
pub async fn run_attempt(
    plugins: &[Arc<dyn Plugin>],
    mut request: WireRequest,
    provider: &dyn Provider,
    progress: Option<ProgressSink>,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<u8>, Error> {
    for plugin in plugins {
        match plugin.will_send(request.clone()).await {
            Ok(updated) => request = updated,
            Err(e) => return Err(dispatch_catch(plugins, e, &request, None).await),
        }
    }

    let response = match provider.call(&request, progress, cancel).await {
        Ok(r) => r,
        Err(e) => return Err(dispatch_catch(plugins, e, &request, None).await),
    };

    for plugin in plugins {
        if let Err(e) = plugin.did_receive(&response, &response.body, &request).await {
            return Err(dispatch_catch(plugins, e, &request, Some(&response)).await);
        }
    }

    let mut data = response.body.clone();
    for plugin in plugins {
        match plugin.process(data, &response, &request).await {
            Ok(updated) => data = updated,
            Err(e) => return Err(dispatch_catch(plugins, e, &request, Some(&response)).await),
        }
    }

    Ok(data)
}

async fn dispatch_catch(
    plugins: &[Arc<dyn Plugin>],
    mut error: Error,
    request: &WireRequest,
    response: Option<&RawResponse>,
) -> Error {
    for plugin in plugins {
        if let Some(replacement) = plugin.did_catch(&error, request, response).await {
            error = replacement;
        }
    }
    error
}
