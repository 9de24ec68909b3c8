use crate::request::Request;
use crate::response::Response;
use thiserror::Error;

/// Boxed error type used wherever an underlying cause crosses a loader or
/// transport boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The closed set of failure classifications a load can produce.
///
/// Every failure flowing out of a chain carries exactly one of these kinds;
/// loaders never raise anything outside this taxonomy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was rejected as malformed before or by the transport.
    #[error("invalid request")]
    InvalidRequest,

    /// No transport could be reached. Also produced by the default loader
    /// behavior when a chain has no terminal loader bound.
    #[error("cannot connect")]
    CannotConnect,

    /// The exchange was cancelled before a response arrived.
    #[error("cancelled")]
    Cancelled,

    /// The transport refused the connection on security grounds.
    #[error("insecure connection")]
    InsecureConnection,

    /// The transport completed without error but produced nothing usable.
    #[error("invalid response")]
    InvalidResponse,

    /// The request could not be resolved into a dispatchable URL.
    #[error("wrong url")]
    WrongUrl,

    /// A request body failed to encode.
    ///
    /// Kept in the taxonomy for caller-supplied loaders; the built-in
    /// transport loader reports encode failures as [`ErrorKind::WrongUrl`]
    /// with the encoder error attached as the source.
    #[error("body encoding failed")]
    BodyEncode,

    /// The request was rejected because the chain is currently resetting.
    #[error("reset in progress")]
    ResetInProgress,

    /// An unclassified transport failure.
    #[error("unknown failure")]
    Unknown,
}

/// A failed load, carrying enough context to log or retry the original call.
#[derive(Error, Debug)]
#[error("{kind}: {} {}", request.method(), request.path())]
pub struct LoadError {
    kind: ErrorKind,
    request: Request,
    response: Option<Response>,
    #[source]
    source: Option<BoxError>,
}

impl LoadError {
    pub fn new(kind: ErrorKind, request: Request) -> Self {
        Self { kind, request, response: None, source: None }
    }

    pub fn with_source(kind: ErrorKind, request: Request, source: impl Into<BoxError>) -> Self {
        Self { kind, request, response: None, source: Some(source.into()) }
    }

    /// Full-context constructor for loaders that obtained a partial response
    /// before failing.
    pub fn from_parts(
        kind: ErrorKind,
        request: Request,
        response: Option<Response>,
        source: Option<BoxError>,
    ) -> Self {
        Self { kind, request, response, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The request whose dispatch failed, as the failing loader observed it.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Any partial response obtained before the failure.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}

/// The outcome of one `load` call: a response, or a classified failure.
pub type LoadResult = Result<Response, LoadError>;

/// Accessors that recover request context from either branch of a
/// [`LoadResult`].
pub trait LoadResultExt {
    /// The originating request, regardless of outcome.
    fn request(&self) -> &Request;

    /// The response, if any was obtained: the success value, or a failure's
    /// partial response.
    fn response(&self) -> Option<&Response>;
}

impl LoadResultExt for LoadResult {
    fn request(&self) -> &Request {
        match self {
            Ok(response) => response.request(),
            Err(error) => error.request(),
        }
    }

    fn response(&self) -> Option<&Response> {
        match self {
            Ok(response) => Some(response),
            Err(error) => error.response(),
        }
    }
}
