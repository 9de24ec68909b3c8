use crate::request::Request;
use crate::transport::TransportResponse;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// A completed HTTP exchange, immutable once constructed.
///
/// Carries the request it answers so callers unwinding a chain can correlate
/// outcomes without threading the request separately.
#[derive(Debug, Clone)]
pub struct Response {
    request: Request,
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    /// Builds a response from the wire-level exchange the transport reported.
    pub fn from_wire(request: Request, wire: TransportResponse) -> Self {
        Self { request, status: wire.status, headers: wire.headers, body: wire.body }
    }

    /// The request this response answers.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The status code. Symbolic classification is available through
    /// [`StatusCode`] itself (`is_success`, `is_client_error`, ...).
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The raw response headers, exactly as the transport delivered them.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw body bytes, if the transport delivered any. Decoding is the
    /// caller's concern.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Human-readable phrase for the status code.
    pub fn message(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("unknown status")
    }
}
