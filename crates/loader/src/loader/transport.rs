use crate::error::{ErrorKind, LoadError, LoadResult};
use crate::loader::{Link, Loader};
use crate::request::Request;
use crate::response::Response;
use crate::transport::{Transport, TransportError, TransportRequest};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The terminal stage: turns the request into wire form, hands it to the
/// transport, and classifies whatever comes back.
///
/// Resolution failures never reach the transport. A request without a usable
/// URL fails with `WrongUrl`, and a body whose encoder refuses fails the
/// same way with the encoder error attached; the taxonomy files both under
/// the URL kind.
pub struct TransportLoader {
    transport: Arc<dyn Transport>,
    next: Link,
}

impl TransportLoader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, next: Link::new() }
    }
}

#[async_trait]
impl Loader for TransportLoader {
    fn next(&self) -> &Link {
        &self.next
    }

    async fn load(&self, request: Request) -> LoadResult {
        let Some(url) = request.url() else {
            return Err(LoadError::new(ErrorKind::WrongUrl, request));
        };

        let body = if request.body().is_empty() {
            None
        } else {
            match request.body().encode() {
                Ok(bytes) => Some(bytes),
                Err(error) => return Err(LoadError::with_source(ErrorKind::WrongUrl, request, error)),
            }
        };

        // Body headers are merged last and win over caller headers of the
        // same name.
        let mut headers = request.headers().clone();
        if body.is_some() {
            for (name, value) in request.body().additional_headers() {
                headers.insert(name, value);
            }
        }

        let wire = TransportRequest { url, method: request.method().clone(), headers, body };
        let exchange = self.transport.perform(wire).await;

        match (exchange.response, exchange.error) {
            (Some(raw), None) => Ok(Response::from_wire(request, raw)),
            (raw, Some(error)) => {
                let kind = classify(&error);
                debug!(id = %request.id(), kind = %kind, cause = %error, "transport reported failure");
                let partial = raw.map(|raw| Response::from_wire(request.clone(), raw));
                Err(LoadError::from_parts(kind, request, partial, Some(Box::new(error))))
            }
            (None, None) => Err(LoadError::new(ErrorKind::InvalidResponse, request)),
        }
    }
}

/// Maps the transport's vocabulary onto the loader taxonomy; unrecognized
/// failures stay `Unknown`.
fn classify(error: &TransportError) -> ErrorKind {
    match error {
        TransportError::BadUrl { .. } => ErrorKind::InvalidRequest,
        TransportError::ConnectionFailed { .. } => ErrorKind::CannotConnect,
        TransportError::Cancelled => ErrorKind::Cancelled,
        TransportError::Insecure { .. } => ErrorKind::InsecureConnection,
        TransportError::Other(_) => ErrorKind::Unknown,
    }
}

impl fmt::Debug for TransportLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportLoader").field("next", &self.next).finish_non_exhaustive()
    }
}
