use crate::body::Body;
use crate::options::{RequestOption, RequestOptions};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

/// Characters escaped in query strings: everything except alphanumerics and
/// the unreserved marks `-`, `.`, `_`, `~`.
const QUERY_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// An outbound request as it travels down a loader chain.
///
/// A request is an owned value: each loader holds it exclusively, mutates its
/// own copy through the `set_*` and `*_mut` accessors, and then moves it to
/// its successor. The `id` is assigned once at construction and is preserved
/// by cloning and mutation, so log lines and errors from every stage of one
/// logical call correlate.
///
/// The addressing fields stay decomposed (`scheme`, `host`, `path`, `query`)
/// until a terminal loader asks for [`Request::url`]; intermediate loaders
/// such as the environment applier fill in the missing parts.
#[derive(Debug, Clone)]
pub struct Request {
    id: Uuid,
    method: Method,
    scheme: String,
    host: Option<String>,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Body,
    options: RequestOptions,
}

impl Request {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            scheme: String::from("https"),
            host: None,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::empty(),
            options: RequestOptions::new(),
        }
    }

    /// Starts building a request; defaults are `GET`, scheme `https`, no
    /// host, empty path and body.
    pub fn builder() -> RequestBuilder {
        RequestBuilder { request: Self::new(Method::GET, "") }
    }

    /// A `GET` request for `path` with an empty body.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `POST` request for `path` carrying `body`.
    pub fn post(path: impl Into<String>, body: Body) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = body;
        request
    }

    /// The identity assigned at construction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.scheme = scheme.into();
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn query_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.query
    }

    pub fn options_mut(&mut self) -> &mut RequestOptions {
        &mut self.options
    }

    /// Renders the addressing fields as a URL.
    ///
    /// Returns `None` while the request is not addressable: the host is
    /// missing or empty, the path is relative, or the parts do not combine
    /// into a valid URI. An empty path renders as `/`. Query names and
    /// values are percent-encoded; unreserved characters pass through.
    pub fn url(&self) -> Option<Uri> {
        let host = self.host.as_deref().filter(|host| !host.is_empty())?;
        if !self.path.is_empty() && !self.path.starts_with('/') {
            return None;
        }

        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        let path_and_query = if self.query.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{}", encode_query(&self.query))
        };

        Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(host)
            .path_and_query(path_and_query)
            .build()
            .ok()
    }
}

fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| {
            format!("{}={}", utf8_percent_encode(name, QUERY_SAFE), utf8_percent_encode(value, QUERY_SAFE))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Consuming builder for [`Request`], mirroring the setter surface.
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.request.scheme = scheme.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.request.host = Some(host.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = path.into();
        self
    }

    /// Appends one query pair; order of insertion is preserved on the wire.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.request.body = body;
        self
    }

    /// Records a typed option on the request.
    pub fn option<O: RequestOption>(mut self, value: O::Value) -> Self {
        self.request.options.set::<O>(value);
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}
