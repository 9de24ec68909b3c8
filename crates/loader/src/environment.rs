use crate::options::RequestOption;
use http::{HeaderMap, HeaderName, HeaderValue};

/// Connection defaults for one server: the host to reach it under, a path
/// prefix its routes live beneath, and headers and query pairs every call
/// should carry.
///
/// An environment never overrides what a request already states; the
/// environment applier fills in only the gaps. Selecting an environment per
/// request goes through the option bag, for which this type is its own
/// option kind:
///
/// ```
/// use http_loader::{RequestOptions, ServerEnvironment};
///
/// let mut options = RequestOptions::new();
/// options.set::<ServerEnvironment>(Some(ServerEnvironment::new("api.example.com", "/api")));
///
/// assert!(options.get::<ServerEnvironment>().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEnvironment {
    host: String,
    path_prefix: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
}

impl ServerEnvironment {
    /// A new environment for `host` with routes under `path_prefix`.
    ///
    /// A non-empty prefix is normalized to start with `/`; an empty prefix
    /// stays empty and contributes nothing to paths.
    pub fn new(host: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        let path_prefix = path_prefix.into();
        let path_prefix = if path_prefix.is_empty() || path_prefix.starts_with('/') {
            path_prefix
        } else {
            format!("/{path_prefix}")
        };

        Self { host: host.into(), path_prefix, headers: HeaderMap::new(), query: Vec::new() }
    }

    /// Adds a default header; a request's own header of the same name wins.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a query pair appended to every request in this environment.
    pub fn query_item(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

impl RequestOption for ServerEnvironment {
    type Value = Option<ServerEnvironment>;

    fn default_value() -> Self::Value {
        None
    }
}
