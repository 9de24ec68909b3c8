use crate::environment::ServerEnvironment;
use crate::error::LoadResult;
use crate::loader::{Link, Loader};
use crate::request::Request;
use async_trait::async_trait;

/// How a relative request path combines with the environment's prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathMode {
    /// The relative path is discarded and the prefix used as-is. This is the
    /// long-standing observed behavior and therefore the default.
    #[default]
    Replace,
    /// The relative path is kept, appended beneath the prefix.
    Prepend,
}

/// Fills a request's addressing gaps from a [`ServerEnvironment`].
///
/// Only gaps are filled: a request that already names a host keeps it, an
/// absolute path is never touched, and a caller-set header always beats the
/// environment's default of the same name. Environment query pairs are
/// appended after whatever the request already carries.
///
/// The environment itself comes from the request's option bag when one was
/// recorded there, falling back to the default given at construction.
#[derive(Debug)]
pub struct ApplyEnvironment {
    environment: ServerEnvironment,
    path_mode: PathMode,
    next: Link,
}

impl ApplyEnvironment {
    pub fn new(environment: ServerEnvironment) -> Self {
        Self { environment, path_mode: PathMode::default(), next: Link::new() }
    }

    /// Selects how relative paths combine with the prefix.
    pub fn path_mode(mut self, mode: PathMode) -> Self {
        self.path_mode = mode;
        self
    }
}

#[async_trait]
impl Loader for ApplyEnvironment {
    fn next(&self) -> &Link {
        &self.next
    }

    async fn load(&self, mut request: Request) -> LoadResult {
        let environment = request
            .options()
            .get::<ServerEnvironment>()
            .unwrap_or_else(|| self.environment.clone());

        // An empty host counts as unset; `Request::url` ignores it anyway.
        if request.host().is_none_or(str::is_empty) {
            request.set_host(environment.host());
        }

        if !request.path().starts_with('/') {
            let path = match self.path_mode {
                PathMode::Replace => environment.path_prefix().to_owned(),
                PathMode::Prepend => {
                    if request.path().is_empty() {
                        environment.path_prefix().to_owned()
                    } else {
                        format!("{}/{}", environment.path_prefix(), request.path())
                    }
                }
            };
            request.set_path(path);
        }

        for (name, value) in environment.headers() {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }

        for (name, value) in environment.query() {
            request.query_mut().push((name.clone(), value.clone()));
        }

        self.next().forward(request).await
    }
}
