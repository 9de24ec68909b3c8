//! A composable dispatch pipeline for outbound HTTP requests
//!
//! This crate models an outbound request as a value traveling down a chain of
//! loaders. Each loader may inspect the request, rewrite it, answer it
//! locally, or hand it to its successor; the terminal loader performs the
//! actual exchange through a pluggable [`Transport`](transport::Transport).
//! Results unwind back through the same stages in reverse order, so every
//! loader sees the outcome of everything below it.
//!
//! # Features
//!
//! - Chain-of-responsibility dispatch with write-once successor links
//! - Typed, defaulting per-request option bag
//! - Environment application: host, path prefix, default headers and query
//! - Fail-fast reset guarding backed by a counting barrier
//! - A narrow transport boundary with four-way outcome classification
//! - Failures as values: every error carries the originating request
//! - Structured logging via tracing
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use http_loader::loader::{ApplyEnvironment, RequestLogger, ResetGuard, TransportLoader};
//! use http_loader::transport::{Exchange, Transport, TransportRequest, TransportResponse};
//! use http_loader::{Loader, Request, ServerEnvironment, chain_of};
//! use std::sync::Arc;
//! use tracing::{Level, info, warn};
//! use tracing_subscriber::FmtSubscriber;
//!
//! struct LoopbackTransport;
//!
//! #[async_trait]
//! impl Transport for LoopbackTransport {
//!     async fn perform(&self, _request: TransportRequest) -> Exchange {
//!         Exchange::success(TransportResponse::default())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let environment = ServerEnvironment::new("api.example.com", "/api");
//!
//!     let chain = chain_of([
//!         Arc::new(RequestLogger::new()) as Arc<dyn Loader>,
//!         Arc::new(ResetGuard::new()),
//!         Arc::new(ApplyEnvironment::new(environment)),
//!         Arc::new(TransportLoader::new(Arc::new(LoopbackTransport))),
//!     ])
//!     .expect("chain is not empty");
//!
//!     match chain.load(Request::get("people")).await {
//!         Ok(response) => info!(status = response.status().as_u16(), "loaded"),
//!         Err(error) => warn!(kind = %error.kind(), "load failed"),
//!     }
//! }
//! ```

mod body;
mod environment;
mod error;
mod options;
mod request;
mod response;

pub mod loader;
pub mod reset;
pub mod transport;

pub use body::Body;
pub use body::EncodeError;
pub use environment::ServerEnvironment;
pub use error::{BoxError, ErrorKind, LoadError, LoadResult, LoadResultExt};
pub use loader::{Link, Loader, chain, chain_of};
pub use options::{RequestOption, RequestOptions};
pub use request::{Request, RequestBuilder};
pub use response::Response;
