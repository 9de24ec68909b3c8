use crate::error::LoadResult;
use crate::loader::{Link, Loader};
use crate::request::Request;
use async_trait::async_trait;
use tracing::{info, warn};

/// Logs every request on the way down and its outcome on the way up.
///
/// Purely observational: the request is forwarded untouched and the
/// successor's result is returned unchanged. The request id appears in both
/// lines, so the two ends of one dispatch correlate even under concurrency.
#[derive(Debug, Default)]
pub struct RequestLogger {
    next: Link,
}

impl RequestLogger {
    pub fn new() -> Self {
        Self { next: Link::new() }
    }
}

#[async_trait]
impl Loader for RequestLogger {
    fn next(&self) -> &Link {
        &self.next
    }

    async fn load(&self, request: Request) -> LoadResult {
        info!(
            id = %request.id(),
            method = %request.method(),
            path = request.path(),
            "dispatching request"
        );

        let result = self.next().forward(request).await;

        match &result {
            Ok(response) => info!(
                id = %response.request().id(),
                status = response.status().as_u16(),
                "request completed"
            ),
            Err(error) => warn!(
                id = %error.request().id(),
                kind = %error.kind(),
                "request failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::response::Response;
    use crate::transport::TransportResponse;
    use http::StatusCode;
    use std::sync::{Arc, Mutex};

    struct Recording {
        seen: Mutex<Vec<String>>,
        next: Link,
    }

    #[async_trait]
    impl Loader for Recording {
        fn next(&self) -> &Link {
            &self.next
        }

        async fn load(&self, request: Request) -> LoadResult {
            self.seen.lock().unwrap().push(request.path().to_owned());
            Ok(Response::from_wire(
                request,
                TransportResponse { status: StatusCode::CREATED, ..Default::default() },
            ))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn logger_is_transparent() {
        let terminal = Arc::new(Recording { seen: Mutex::new(Vec::new()), next: Link::new() });
        let logger = RequestLogger::new();
        logger.bind(terminal.clone());

        let response = logger.load(Request::get("/people")).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(*terminal.seen.lock().unwrap(), ["/people"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn logger_passes_failures_through_unchanged() {
        let logger = RequestLogger::new();
        let error = logger.load(Request::get("/people")).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CannotConnect);
    }
}
