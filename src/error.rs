//! Error model.
//!
//! A typed error carrying a numeric code, a message, the HTTP response that
//! produced it (when there is one), and an optional underlying cause.
//! Well-known codes are reserved for construction-time failures and for the
//! XPath projector; everything else (transport failures, HTTP status
//! failures) carries a provider- or server-assigned code.

use std::fmt;

/// Invalid URL supplied to the builder.
pub const CODE_INVALID_URL: i64 = 80_000_001;
/// Parameter encoding failed (URL-query or JSON-body).
pub const CODE_ENCODING_FAILURE: i64 = 80_000_002;
/// The descriptor could not be turned into a wire request.
pub const CODE_REQUEST_CONSTRUCTION: i64 = 80_000_003;
/// Response bytes could not be decoded into the requested shape.
pub const CODE_RESPONSE_DECODING: i64 = 80_000_004;
/// A retry policy returned a non-finite delay.
pub const CODE_INVALID_RETRY_DELAY: i64 = 80_000_007;
/// A required XPath projection found no value at its path.
pub const CODE_XPATH_MISSING: i64 = 80_020_001;
/// A required XPath projection found a value of the wrong type.
pub const CODE_XPATH_TYPE_MISMATCH: i64 = 80_020_002;

/// Response metadata preserved alongside an HTTP-level error.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// The six-way taxonomy from spec §7, coarser than the numeric codes: lets
/// callers match broadly (`category()`, `is_retryable()`) instead of
/// switching on individual codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid URL, encoding failure, request construction failure —
    /// surfaced before any I/O, never retried.
    Construction,
    /// Provider-thrown: network-level problems or HTTP non-2xx. Retryable
    /// per policy.
    Transport,
    /// A plugin hook threw. Retryable per policy.
    Pipeline,
    /// Response decoding or XPath projection failure. Not retried.
    Parse,
    /// The retry engine itself rejected a policy's decision (invalid delay).
    Engine,
    /// The caller withdrew interest in the operation.
    Cancellation,
}

/// The framework's typed error.
///
/// Carries a numeric `code`, a human-readable `message`, the originating
/// [`ResponseMeta`] when the failure surfaced through an HTTP response, and
/// an optional underlying cause accessible through [`std::error::Error::source`].
///
/// Cancellation is represented separately (see [`Error::is_cancelled`]); it
/// never carries one of the well-known numeric codes because it is not a
/// failure of the request, it is the caller withdrawing interest in it.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("[{code}] {message}")]
    Coded {
        code: i64,
        message: String,
        category: ErrorCategory,
        response: Option<ResponseMeta>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    fn coded(code: i64, category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Coded {
                code,
                message: message.into(),
                category,
                response: None,
                source: None,
            },
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::coded(CODE_INVALID_URL, ErrorCategory::Construction, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::coded(CODE_ENCODING_FAILURE, ErrorCategory::Construction, message)
    }

    pub fn construction(message: impl Into<String>) -> Self {
        Self::coded(CODE_REQUEST_CONSTRUCTION, ErrorCategory::Construction, message)
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::coded(CODE_RESPONSE_DECODING, ErrorCategory::Parse, message)
    }

    pub fn invalid_retry_delay(message: impl Into<String>) -> Self {
        Self::coded(CODE_INVALID_RETRY_DELAY, ErrorCategory::Engine, message)
    }

    pub fn xpath_missing(path: impl Into<String>) -> Self {
        Self::coded(
            CODE_XPATH_MISSING,
            ErrorCategory::Parse,
            format!("missing required path `{}`", path.into()),
        )
    }

    pub fn xpath_type_mismatch(path: impl Into<String>, expected: &str, found: &str) -> Self {
        let path = path.into();
        Self::coded(
            CODE_XPATH_TYPE_MISMATCH,
            ErrorCategory::Parse,
            format!("type mismatch at `{path}`: expected {expected}, found {found}"),
        )
    }

    /// An HTTP response with status >= 400. `code` is the status code.
    pub fn http(status: u16, message: impl Into<String>, response: ResponseMeta) -> Self {
        Self {
            kind: ErrorKind::Coded {
                code: status as i64,
                message: message.into(),
                category: ErrorCategory::Transport,
                response: Some(response),
                source: None,
            },
        }
    }

    /// A provider/transport-level failure with no HTTP response available.
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::Coded {
                code: 0,
                message: message.into(),
                category: ErrorCategory::Transport,
                response: None,
                source: Some(Box::new(source)),
            },
        }
    }

    /// A plugin hook threw.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::coded(0, ErrorCategory::Pipeline, message)
    }

    /// The dedicated cancellation signal (see spec §7 point 6).
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    pub fn is_invalid_url(&self) -> bool {
        matches!(
            &self.kind,
            ErrorKind::Coded { code, .. } if *code == CODE_INVALID_URL
        )
    }

    /// The numeric code, if this is a coded (non-cancellation) error.
    pub fn code(&self) -> Option<i64> {
        match &self.kind {
            ErrorKind::Coded { code, .. } => Some(*code),
            ErrorKind::Cancelled => None,
        }
    }

    pub fn message(&self) -> &str {
        match &self.kind {
            ErrorKind::Coded { message, .. } => message,
            ErrorKind::Cancelled => "operation cancelled",
        }
    }

    pub fn response(&self) -> Option<&ResponseMeta> {
        match &self.kind {
            ErrorKind::Coded { response, .. } => response.as_ref(),
            ErrorKind::Cancelled => None,
        }
    }

    /// Which of the six spec §7 categories this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match &self.kind {
            ErrorKind::Coded { category, .. } => *category,
            ErrorKind::Cancelled => ErrorCategory::Cancellation,
        }
    }

    /// Whether a retry policy is even consulted for this error — true only
    /// for `Transport`/`Pipeline` (spec §7: construction/parse/engine/
    /// cancellation are never retried; transport/pipeline are retried per
    /// policy).
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transport | ErrorCategory::Pipeline)
    }

    /// The engine never retries cancellation or an invalid-URL failure; the
    /// policy has final say over everything else (spec §4.4).
    pub fn is_engine_terminal(&self) -> bool {
        !self.is_retryable()
    }

    pub(crate) fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        if let ErrorKind::Coded { source: slot, .. } = &mut self.kind {
            *slot = Some(Box::new(source));
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_has_no_code() {
        let e = Error::cancelled();
        assert!(e.is_cancelled());
        assert_eq!(e.code(), None);
    }

    #[test]
    fn http_error_preserves_status_and_response() {
        let meta = ResponseMeta {
            status: 404,
            headers: vec![],
            body: b"not found".to_vec(),
        };
        let e = Error::http(404, "not found", meta);
        assert_eq!(e.code(), Some(404));
        assert!(e.response().is_some());
        assert!(!e.is_engine_terminal());
    }

    #[test]
    fn invalid_url_is_engine_terminal() {
        let e = Error::invalid_url("missing scheme");
        assert_eq!(e.code(), Some(CODE_INVALID_URL));
        assert!(e.is_engine_terminal());
    }

    #[test]
    fn construction_errors_are_not_retryable() {
        for e in [
            Error::invalid_url("x"),
            Error::encoding("x"),
            Error::construction("x"),
        ] {
            assert_eq!(e.category(), ErrorCategory::Construction);
            assert!(!e.is_retryable());
        }
    }

    #[test]
    fn parse_errors_are_not_retryable() {
        for e in [
            Error::decoding("x"),
            Error::xpath_missing("a/b"),
            Error::xpath_type_mismatch("a/b", "string", "number"),
        ] {
            assert_eq!(e.category(), ErrorCategory::Parse);
            assert!(!e.is_retryable());
        }
    }

    #[test]
    fn engine_errors_are_not_retryable() {
        let e = Error::invalid_retry_delay("delay was NaN");
        assert_eq!(e.category(), ErrorCategory::Engine);
        assert!(!e.is_retryable());
    }

    #[test]
    fn transport_and_pipeline_errors_are_retryable() {
        let meta = ResponseMeta {
            status: 503,
            headers: vec![],
            body: vec![],
        };
        let e = Error::http(503, "unavailable", meta);
        assert_eq!(e.category(), ErrorCategory::Transport);
        assert!(e.is_retryable());

        let e = Error::plugin("hook threw");
        assert_eq!(e.category(), ErrorCategory::Pipeline);
        assert!(e.is_retryable());
    }

    #[test]
    fn cancellation_category_is_not_retryable() {
        let e = Error::cancelled();
        assert_eq!(e.category(), ErrorCategory::Cancellation);
        assert!(!e.is_retryable());
        assert!(e.is_engine_terminal());
    }
}
