use crate::error::BoxError;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Characters escaped in form bodies: everything except ASCII alphanumerics.
/// A space therefore renders as `%20`, never `+`.
const FORM_SAFE: &AsciiSet = NON_ALPHANUMERIC;

/// An error produced while encoding a request body to bytes.
#[derive(Debug, Error)]
#[error("body encoding failed: {source}")]
pub struct EncodeError {
    #[from]
    source: BoxError,
}

/// The payload of an outbound request.
///
/// A body knows two things: which headers its presence requires on the wire
/// (`additional_headers`), and how to render itself to bytes (`encode`).
/// Encoding is pure: it reads only captured state and may be repeated
/// without side effects.
#[derive(Clone)]
pub struct Body {
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    /// No payload at all.
    Empty,
    /// Caller-supplied bytes plus whatever headers describe them.
    Raw { content: Bytes, headers: Vec<(HeaderName, HeaderValue)> },
    /// A typed value captured behind a deferred encoder.
    Json { encoder: Arc<dyn Fn() -> Result<Vec<u8>, BoxError> + Send + Sync> },
    /// Ordered name/value pairs rendered as a form-urlencoded string.
    Form { fields: Vec<(String, String)> },
}

impl Body {
    /// A body with no payload; encodes to zero bytes.
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// Wraps pre-encoded bytes with no extra headers.
    pub fn raw(content: impl Into<Bytes>) -> Self {
        Self::raw_with_headers(content, Vec::new())
    }

    /// Wraps pre-encoded bytes plus the headers that describe them
    /// (typically a content type).
    pub fn raw_with_headers(content: impl Into<Bytes>, headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self { kind: Kind::Raw { content: content.into(), headers } }
    }

    /// A body holding `value`, rendered as JSON when the chain encodes it.
    ///
    /// The value is captured now; serialization is deferred until a terminal
    /// loader builds the wire request, and a serialization failure surfaces
    /// there as a failed load rather than a panic.
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::encoded_with(value, |value| serde_json::to_vec(value))
    }

    /// A body holding `value` behind a caller-supplied encoder.
    ///
    /// This is the general form of [`Body::json`]: any encoder producing
    /// bytes can back the body, and its failure is reported as an
    /// [`EncodeError`] at encode time.
    pub fn encoded_with<T, F, E>(value: T, encoder: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> Result<Vec<u8>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let encoder = Arc::new(move || encoder(&value).map_err(Into::into));
        Self { kind: Kind::Json { encoder } }
    }

    /// A body of ordered form fields, rendered `name=value` joined by `&`.
    ///
    /// Names and values are percent-encoded with an alphanumerics-only safe
    /// set. A field with an empty value renders as `name=`.
    pub fn form<N, V>(fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        let fields = fields.into_iter().map(|(name, value)| (name.into(), value.into())).collect();
        Self { kind: Kind::Form { fields } }
    }

    /// Whether the body contributes any payload to the wire request.
    ///
    /// Encoded bodies always count as non-empty: the captured value exists
    /// even though its bytes are not rendered yet. A form body is empty only
    /// when it has no fields.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Raw { content, .. } => content.is_empty(),
            Kind::Json { .. } => false,
            Kind::Form { fields } => fields.is_empty(),
        }
    }

    /// Headers this body requires on the wire request.
    pub fn additional_headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        match &self.kind {
            Kind::Empty => Vec::new(),
            Kind::Raw { headers, .. } => headers.clone(),
            Kind::Json { .. } => {
                vec![(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"))]
            }
            Kind::Form { .. } => {
                vec![(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"))]
            }
        }
    }

    /// Renders the body to bytes.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        match &self.kind {
            Kind::Empty => Ok(Bytes::new()),
            Kind::Raw { content, .. } => Ok(content.clone()),
            Kind::Json { encoder } => encoder().map(Bytes::from).map_err(EncodeError::from),
            Kind::Form { fields } => {
                let encoded = fields
                    .iter()
                    .map(|(name, value)| {
                        format!(
                            "{}={}",
                            utf8_percent_encode(name, FORM_SAFE),
                            utf8_percent_encode(value, FORM_SAFE)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("&");
                Ok(Bytes::from(encoded))
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("Body::Empty"),
            Kind::Raw { content, .. } => f.debug_tuple("Body::Raw").field(&content.len()).finish(),
            Kind::Json { .. } => f.write_str("Body::Json"),
            Kind::Form { fields } => f.debug_tuple("Body::Form").field(&fields.len()).finish(),
        }
    }
}
