use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};
use http_loader::loader::{ApplyEnvironment, ModifyRequest, RequestLogger, ResetGuard, TransportLoader};
use http_loader::transport::{Exchange, Transport, TransportRequest, TransportResponse};
use http_loader::{Body, Loader, Request, ServerEnvironment, chain_of};
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Stands in for a real HTTP client: answers every request locally, echoing
/// the resolved method and URL back in the body.
struct EchoTransport;

#[async_trait]
impl Transport for EchoTransport {
    async fn perform(&self, request: TransportRequest) -> Exchange {
        Exchange::success(TransportResponse {
            status: StatusCode::OK,
            body: Some(Bytes::from(format!("{} {}", request.method, request.url))),
            ..Default::default()
        })
    }
}

fn print_outcome(result: http_loader::LoadResult) {
    match result {
        Ok(response) => {
            let body = response
                .body()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default();
            info!(status = response.status().as_u16(), body = %body, "loaded");
        }
        Err(error) => warn!(kind = %error.kind(), path = error.request().path(), "load failed"),
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let environment = ServerEnvironment::new("api.example.com", "/api")
        .header(header::ACCEPT, HeaderValue::from_static("application/json"));

    let chain = chain_of([
        Arc::new(RequestLogger::new()) as Arc<dyn Loader>,
        Arc::new(ResetGuard::new()),
        Arc::new(ModifyRequest::new(|mut request| {
            request.headers_mut().insert(header::USER_AGENT, HeaderValue::from_static("getting-started"));
            request
        })),
        Arc::new(ApplyEnvironment::new(environment)),
        Arc::new(TransportLoader::new(Arc::new(EchoTransport))),
    ])
    .expect("chain is not empty");

    // No explicit host or absolute path; the environment fills in both.
    print_outcome(chain.load(Request::get("people")).await);

    // A form body; the terminal loader encodes it and sets the content type.
    let signup = Request::post("/signup", Body::form([("name", "Luke"), ("zip", "12345")]));
    print_outcome(chain.load(signup).await);

    // Reset before reusing the chain, e.g. after a credential change.
    chain.reset().await;
    info!("chain reset");

    print_outcome(chain.load(Request::get("people")).await);
}
