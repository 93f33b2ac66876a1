//! Typed HTTP client framework: a fluent request builder, a pluggable
//! transport (`Provider`) contract, a four-phase plugin pipeline, typed
//! retry policies, a bounded-concurrency gate, and an XPath-style JSON
//! response projector.
//!
//! The framework specifies the request lifecycle and the seams transports
//! and middleware plug into; it does not ship an HTTP transport itself —
//! callers supply a [`provider::Provider`] (a real one backed by whatever
//! HTTP library they prefer, or [`provider::StubProvider`] for tests).

pub mod config;
pub mod encoding;
pub mod error;
pub mod params;
pub mod plugin;
pub mod provider;
pub mod request;
pub mod retry;
pub mod stream;
pub mod xpath;

pub use config::ClientConfig;
pub use error::{Error, ErrorCategory, Result};
pub use params::{ParamItem, Parameters, TypedParameter};
pub use plugin::Plugin;
pub use provider::{ConcurrencyGate, Provider, RawResponse, WireRequest};
pub use request::{Method, Request};
pub use retry::{RetryOptions, RetryPolicy};
pub use stream::RequestStream;
pub use xpath::{ParseConfig, Projected, TypeTag};
