//! The boundary between the loader chain and whatever actually moves bytes.
//!
//! Everything below [`Transport::perform`] is somebody else's machinery (an
//! HTTP client, a socket pool, a test double). The chain hands it a fully
//! resolved [`TransportRequest`] and gets back an [`Exchange`], a plain
//! record of what came back, which the terminal loader then classifies.

use crate::error::BoxError;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use thiserror::Error;

/// A wire-ready request: resolved URL, final headers, encoded body.
/// `body` is `None` when the request carries no payload at all.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub url: Uri,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// What the transport read off the wire.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Outcome of one transport attempt.
///
/// Response and error are independent: a failed transfer may still carry the
/// partial response that was received before things went wrong, and a
/// transport bug may produce neither. The terminal loader turns the four
/// combinations into a single [`LoadResult`](crate::error::LoadResult).
#[derive(Debug, Default)]
pub struct Exchange {
    pub response: Option<TransportResponse>,
    pub error: Option<TransportError>,
}

impl Exchange {
    /// A completed transfer.
    pub fn success(response: TransportResponse) -> Self {
        Self { response: Some(response), error: None }
    }

    /// A failed transfer with nothing received.
    pub fn failure(error: TransportError) -> Self {
        Self { response: None, error: Some(error) }
    }

    /// A failed transfer that still produced a partial response.
    pub fn failure_with_partial(response: TransportResponse, error: TransportError) -> Self {
        Self { response: Some(response), error: Some(error) }
    }

    /// Neither response nor error; a transport contract violation.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Failure reported by a transport, in its own vocabulary.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("url rejected by transport: {url}")]
    BadUrl { url: String },
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },
    #[error("transfer cancelled")]
    Cancelled,
    #[error("connection is not secure: {reason}")]
    Insecure { reason: String },
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl TransportError {
    pub fn bad_url(url: impl Into<String>) -> Self {
        Self::BadUrl { url: url.into() }
    }

    pub fn connection_failed(reason: impl Into<String>) -> Self {
        Self::ConnectionFailed { reason: reason.into() }
    }

    pub fn insecure(reason: impl Into<String>) -> Self {
        Self::Insecure { reason: reason.into() }
    }

    pub fn other(source: impl Into<BoxError>) -> Self {
        Self::Other(source.into())
    }
}

/// Performs a resolved request against the outside world.
///
/// Implementations report failures through the returned [`Exchange`] rather
/// than by panicking; the chain treats whatever comes back as data.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: TransportRequest) -> Exchange;
}
