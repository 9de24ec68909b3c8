//! The loader chain.
//!
//! A loader is one stage in a chain of responsibility for outbound requests:
//! it may inspect the request, rewrite it, answer it locally, or hand it to
//! its successor. Requests travel down the chain in bind order; results
//! unwind through the same stages in reverse, so a loader's post-processing
//! always runs after everything below it and before everything above it.
//!
//! Successor links are write-once. A chain is assembled exactly once, before
//! use, by [`Loader::bind`] or the [`chain`] / [`chain_of`] helpers; binding
//! a loader that already has a successor is a programming error and panics.

mod apply_environment;
mod logging;
mod modify;
mod reset_guard;
mod transport;

pub use apply_environment::{ApplyEnvironment, PathMode};
pub use logging::RequestLogger;
pub use modify::ModifyRequest;
pub use reset_guard::ResetGuard;
pub use transport::TransportLoader;

use crate::error::{ErrorKind, LoadError, LoadResult};
use crate::request::Request;
use crate::reset::ResetBarrier;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// The write-once successor cell every loader embeds.
pub struct Link {
    successor: OnceCell<Arc<dyn Loader>>,
}

impl Link {
    pub fn new() -> Self {
        Self { successor: OnceCell::new() }
    }

    /// Assigns the successor.
    ///
    /// # Panics
    ///
    /// Panics if a successor is already bound; links are write-once.
    pub fn bind(&self, successor: Arc<dyn Loader>) {
        if self.successor.set(successor).is_err() {
            panic!("loader already has a successor; links are write-once");
        }
    }

    pub fn get(&self) -> Option<&Arc<dyn Loader>> {
        self.successor.get()
    }

    /// Hands the request to the successor, or fails the load with
    /// `CannotConnect` when none is bound.
    pub async fn forward(&self, request: Request) -> LoadResult {
        match self.successor.get() {
            Some(next) => next.load(request).await,
            None => Err(LoadError::new(ErrorKind::CannotConnect, request)),
        }
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.successor.get() {
            Some(_) => f.write_str("Link(bound)"),
            None => f.write_str("Link(unbound)"),
        }
    }
}

/// One stage in a request-dispatch chain.
///
/// Implementors store a [`Link`] and return it from [`Loader::next`];
/// everything else has a default. The default [`Loader::load`] forwards
/// unchanged, so a loader overrides it only to add behavior on the way down
/// (before the forward) or on the way up (after awaiting it):
///
/// ```ignore
/// async fn load(&self, request: Request) -> LoadResult {
///     let request = self.rewrite(request);        // way down
///     let result = self.next().forward(request).await;
///     self.inspect(&result);                      // way up
///     result
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// The successor cell of this loader.
    fn next(&self) -> &Link;

    /// Dispatches a request. The default forwards to the successor and
    /// fails with `CannotConnect` when there is none.
    async fn load(&self, request: Request) -> LoadResult {
        self.next().forward(request).await
    }

    /// Propagates a reset down the chain.
    ///
    /// A stateful loader overrides this to clear its state, entering the
    /// barrier for as long as its cleanup runs. The default just forwards;
    /// without a successor it is a no-op.
    async fn reset_with(&self, barrier: &ResetBarrier) {
        if let Some(next) = self.next().get() {
            next.reset_with(barrier).await;
        }
    }

    /// Resets this loader and everything below it, returning once every
    /// participant has finished its cleanup.
    async fn reset(&self) {
        let (barrier, completion) = ResetBarrier::new();
        self.reset_with(&barrier).await;
        drop(barrier);
        completion.wait().await;
    }

    /// Binds `successor` as this loader's next stage.
    ///
    /// # Panics
    ///
    /// Panics if this loader already has a successor.
    fn bind(&self, successor: Arc<dyn Loader>) {
        self.next().bind(successor);
    }
}

/// Joins two optional chain segments.
///
/// With both present, `second` becomes the successor of `first` and `first`
/// is returned; with one absent, the other passes through; with both absent,
/// the result is `None`. Call sites can therefore fold segments together
/// without null checks at every step.
///
/// # Panics
///
/// Panics if both are present and `first` already has a successor.
pub fn chain(first: Option<Arc<dyn Loader>>, second: Option<Arc<dyn Loader>>) -> Option<Arc<dyn Loader>> {
    match (first, second) {
        (Some(first), Some(second)) => {
            first.bind(second);
            Some(first)
        }
        (Some(first), None) => Some(first),
        (None, second) => second,
    }
}

/// Folds loaders into a chain running top to bottom in iteration order.
///
/// `chain_of([a, b, c])` returns `a` with `b` bound below it and `c` below
/// that. Each loader is bound at most once.
pub fn chain_of<I>(loaders: I) -> Option<Arc<dyn Loader>>
where
    I: IntoIterator<Item = Arc<dyn Loader>>,
    I::IntoIter: DoubleEndedIterator,
{
    loaders.into_iter().rfold(None, |tail, loader| chain(Some(loader), tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ServerEnvironment;
    use crate::response::Response;
    use crate::transport::{Exchange, Transport, TransportRequest, TransportResponse};
    use bytes::Bytes;
    use http::{HeaderValue, Method, StatusCode};
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Bare loader with nothing but a link; exercises the defaults.
    struct Probe {
        next: Link,
    }

    impl Probe {
        fn new() -> Self {
            Self { next: Link::new() }
        }
    }

    #[async_trait]
    impl Loader for Probe {
        fn next(&self) -> &Link {
            &self.next
        }
    }

    /// Records its tag on the way down and on the way up.
    struct Tagging {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        next: Link,
    }

    #[async_trait]
    impl Loader for Tagging {
        fn next(&self) -> &Link {
            &self.next
        }

        async fn load(&self, request: Request) -> LoadResult {
            self.log.lock().unwrap().push(format!("{}>", self.tag));
            let result = self.next().forward(request).await;
            self.log.lock().unwrap().push(format!("<{}", self.tag));
            result
        }
    }

    /// Terminal stage answering every request with an empty 200.
    struct Terminal {
        log: Arc<Mutex<Vec<String>>>,
        next: Link,
    }

    #[async_trait]
    impl Loader for Terminal {
        fn next(&self) -> &Link {
            &self.next
        }

        async fn load(&self, request: Request) -> LoadResult {
            self.log.lock().unwrap().push(String::from("terminal"));
            Ok(Response::from_wire(request, TransportResponse::default()))
        }
    }

    /// Stateful stage whose reset runs on a spawned task.
    struct SlowReset {
        log: Arc<Mutex<Vec<String>>>,
        next: Link,
    }

    #[async_trait]
    impl Loader for SlowReset {
        fn next(&self) -> &Link {
            &self.next
        }

        async fn reset_with(&self, barrier: &ResetBarrier) {
            let token = barrier.enter();
            let log = self.log.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                log.lock().unwrap().push(String::from("cleared"));
                drop(token);
            });
            if let Some(next) = self.next().get() {
                next.reset_with(barrier).await;
            }
        }
    }

    fn arc(loader: impl Loader + 'static) -> Arc<dyn Loader> {
        Arc::new(loader)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn load_without_successor_is_cannot_connect() {
        let probe = Probe::new();
        let request = Request::get("/people");
        let id = request.id();

        let error = probe.load(request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CannotConnect);
        assert_eq!(error.request().id(), id);
    }

    #[test]
    #[should_panic(expected = "write-once")]
    fn binding_twice_panics() {
        let probe = Probe::new();
        probe.bind(arc(Probe::new()));
        probe.bind(arc(Probe::new()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn results_unwind_in_reverse_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let outer = Tagging { tag: "outer", log: log.clone(), next: Link::new() };
        let inner = Tagging { tag: "inner", log: log.clone(), next: Link::new() };
        inner.bind(arc(Terminal { log: log.clone(), next: Link::new() }));
        outer.bind(arc(inner));

        outer.load(Request::get("/")).await.unwrap();

        assert_eq!(*log.lock().unwrap(), ["outer>", "inner>", "terminal", "<inner", "<outer"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn chain_passes_through_absent_sides() {
        assert!(chain(None, None).is_none());

        let log = Arc::new(Mutex::new(Vec::new()));
        let only = chain(Some(arc(Terminal { log: log.clone(), next: Link::new() })), None).unwrap();
        only.load(Request::get("/")).await.unwrap();

        let only = chain(None, Some(arc(Terminal { log: log.clone(), next: Link::new() }))).unwrap();
        only.load(Request::get("/")).await.unwrap();

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn chain_of_composes_in_iteration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let head = chain_of([
            arc(Tagging { tag: "a", log: log.clone(), next: Link::new() }),
            arc(Tagging { tag: "b", log: log.clone(), next: Link::new() }),
            arc(Terminal { log: log.clone(), next: Link::new() }),
        ])
        .unwrap();

        head.load(Request::get("/")).await.unwrap();

        assert_eq!(*log.lock().unwrap(), ["a>", "b>", "terminal", "<b", "<a"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn reset_waits_for_spawned_cleanup() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let head = Probe::new();
        head.bind(arc(SlowReset { log: log.clone(), next: Link::new() }));

        head.reset().await;

        assert_eq!(*log.lock().unwrap(), ["cleared"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn reset_on_a_stateless_chain_returns_immediately() {
        let probe = Probe::new();
        probe.reset().await;
    }

    /// Transport double for whole-chain scenarios: records the wire request
    /// and replies with a scripted exchange.
    struct StubTransport {
        wire: Mutex<Option<TransportRequest>>,
        reply: Mutex<Option<Exchange>>,
    }

    impl StubTransport {
        fn replying(reply: Exchange) -> Arc<Self> {
            Arc::new(Self { wire: Mutex::new(None), reply: Mutex::new(Some(reply)) })
        }

        fn wire(&self) -> TransportRequest {
            self.wire.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn perform(&self, request: TransportRequest) -> Exchange {
            *self.wire.lock().unwrap() = Some(request);
            self.reply.lock().unwrap().take().unwrap_or_else(Exchange::empty)
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn environment_defaults_reach_the_wire() {
        let transport = StubTransport::replying(Exchange::success(TransportResponse::default()));
        let head = chain_of([
            arc(ApplyEnvironment::new(ServerEnvironment::new("api.example.com", "/api"))),
            arc(TransportLoader::new(transport.clone())),
        ])
        .unwrap();

        head.load(Request::get("people")).await.unwrap();

        let wire = transport.wire();
        assert_eq!(wire.url.to_string(), "https://api.example.com/api");
        assert_eq!(wire.method, Method::GET);
        assert!(wire.body.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn successful_response_body_round_trips() {
        let original = Person { name: String::from("Luke") };
        let reply = Exchange::success(TransportResponse {
            status: StatusCode::OK,
            body: Some(Bytes::from(serde_json::to_vec(&original).unwrap())),
            ..Default::default()
        });

        let transport = StubTransport::replying(reply);
        let head = chain_of([
            arc(ApplyEnvironment::new(ServerEnvironment::new("api.example.com", "/api"))),
            arc(TransportLoader::new(transport)),
        ])
        .unwrap();

        let response = head.load(Request::get("people")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let decoded: Person = serde_json::from_slice(response.body().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn transport_bad_url_surfaces_as_invalid_request_with_the_same_request() {
        let transport =
            StubTransport::replying(Exchange::failure(crate::transport::TransportError::bad_url("mangled")));
        let loader = TransportLoader::new(transport);

        let request = Request::builder().host("api.example.com").path("/people").build();
        let id = request.id();

        let error = loader.load(request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
        assert_eq!(error.request().id(), id);
        assert_eq!(error.request().path(), "/people");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn full_chain_applies_every_stage_in_order() {
        let transport = StubTransport::replying(Exchange::success(TransportResponse::default()));
        let head = chain_of([
            arc(RequestLogger::new()),
            arc(ResetGuard::new()),
            arc(ModifyRequest::new(|mut request| {
                request
                    .headers_mut()
                    .insert(http::header::USER_AGENT, HeaderValue::from_static("loader-chain"));
                request
            })),
            arc(ApplyEnvironment::new(ServerEnvironment::new("api.example.com", "/api"))),
            arc(TransportLoader::new(transport.clone())),
        ])
        .unwrap();

        let response = head.load(Request::get("people")).await.unwrap();
        assert!(response.is_success());

        let wire = transport.wire();
        assert_eq!(wire.url.to_string(), "https://api.example.com/api");
        assert_eq!(wire.headers.get(http::header::USER_AGENT).unwrap(), "loader-chain");
    }
}
