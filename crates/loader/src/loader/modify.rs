use crate::error::LoadResult;
use crate::loader::{Link, Loader};
use crate::request::Request;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Rewrites every request with a caller-supplied transform before forwarding.
///
/// The transform owns the request for its duration and must return one; the
/// successor only ever sees the transformed value.
pub struct ModifyRequest {
    transform: Arc<dyn Fn(Request) -> Request + Send + Sync>,
    next: Link,
}

impl ModifyRequest {
    pub fn new(transform: impl Fn(Request) -> Request + Send + Sync + 'static) -> Self {
        Self { transform: Arc::new(transform), next: Link::new() }
    }

    /// A modifier that forwards every request untouched.
    pub fn identity() -> Self {
        Self::new(|request| request)
    }
}

#[async_trait]
impl Loader for ModifyRequest {
    fn next(&self) -> &Link {
        &self.next
    }

    async fn load(&self, request: Request) -> LoadResult {
        let request = (self.transform)(request);
        self.next().forward(request).await
    }
}

impl fmt::Debug for ModifyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifyRequest").field("next", &self.next).finish_non_exhaustive()
    }
}
