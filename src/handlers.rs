use crate::config::SharedConfig;
use crate::report::status_report;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Method, Request, Response, StatusCode};
use tokio::net::TcpStream;
use tracing::error;

pub async fn handle_connection(stream: TcpStream, config: SharedConfig) {
    let service = service_fn(move |req| {
        let config = config.clone();
        async move { route_request(req, config).await }
    });

    if let Err(e) = Http::new().serve_connection(stream, service).await {
        error!("HTTP connection error: {}", e);
    }
}

fn plain_text(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn is_status_path(path: &str) -> bool {
    path == "/status" || path.starts_with("/status/")
}

pub async fn route_request(
    req: Request<Body>,
    config: SharedConfig,
) -> Result<Response<Body>, hyper::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, path) if is_status_path(path) => {
            let report = status_report(&config).await;
            Ok(plain_text(StatusCode::OK, report))
        }
        _ => Ok(plain_text(StatusCode::NOT_FOUND, "404 page not found\n")),
    }
}
