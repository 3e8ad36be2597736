//! # HTTP Server
//!
//! Thin transport adapter around the synchronous core: parses inbound hyper
//! requests into [`Request`] values, runs [`Application::dispatch`], and
//! emits the resulting [`Response`]. Implements graceful shutdown with
//! signal handling.
//!
//! Core errors surfacing from a dispatch are configuration bugs; the adapter
//! maps them to a 500 so one broken route cannot take the listener down.

use crate::app::Application;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use crate::router::Method;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// HTTP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8000).into(),
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

/// HTTP/1 server driving an [`Application`]
pub struct Server {
    config: ServerConfig,
    app: Arc<Application>,
}

impl Server {
    /// Create a server around an assembled application
    #[must_use]
    pub fn new(app: Application) -> Self {
        Self {
            config: ServerConfig::default(),
            app: Arc::new(app),
        }
    }

    /// Bind the server to an address
    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// Set max request body size
    pub fn set_max_body_size(&mut self, bytes: usize) {
        self.config.max_body_size = bytes;
    }

    /// Start the server with graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] when the listen address is unavailable and
    /// propagates accept-loop IO failures
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.address;

        let socket = tokio::net::TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(addr).map_err(|e| Error::Bind {
            address: addr.to_string(),
            source: e,
        })?;

        let listener = socket.listen(1024)?;

        info!("Server listening on http://{}", addr);

        let active = Arc::new(AtomicUsize::new(0));
        let max_body_size = self.config.max_body_size;

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = accept_result?;
                    let io = TokioIo::new(stream);

                    let app = Arc::clone(&self.app);
                    let active = Arc::clone(&active);

                    tokio::task::spawn(async move {
                        active.fetch_add(1, Ordering::Relaxed);

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service_fn(move |req| {
                                let app = Arc::clone(&app);
                                async move {
                                    let method = req.method().clone();
                                    let path = req.uri().path().to_string();

                                    let result =
                                        handle_request(req, &app, remote_addr, max_body_size).await;

                                    match &result {
                                        Ok(resp) => {
                                            info!("    {} - \"{} {}\" {}",
                                                remote_addr,
                                                method,
                                                path,
                                                resp.status()
                                            );
                                        }
                                        Err(_) => {
                                            error!("    {} - \"{} {}\" ERROR",
                                                remote_addr,
                                                method,
                                                path
                                            );
                                        }
                                    }
                                    result
                                }
                            }))
                            .await
                        {
                            error!("Error serving connection: {:?}", err);
                        }
                        active.fetch_sub(1, Ordering::Relaxed);
                    });
                }
                _ = shutdown_signal() => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        let timeout = self.config.shutdown_timeout;
        let drain = async {
            loop {
                if active.load(Ordering::Relaxed) == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        let _ = tokio::time::timeout(timeout, drain).await;
        Ok(())
    }

    /// Execute a request directly, without the network stack
    ///
    /// Applies the same body limit and error mapping as the wire path.
    pub fn test_dispatch(
        &self,
        method: Method,
        path: impl Into<String>,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Response {
        if let Some(b) = body.as_ref() {
            if b.len() > self.config.max_body_size {
                return Response::json(r#"{"error": "Payload Too Large"}"#).with_status(413);
            }
        }
        let mut request = Request::new(method, path, headers, body);
        dispatch_or_500(&self.app, &mut request)
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}

/// Stamp a request id and run the core dispatch, mapping errors to 500
fn dispatch_or_500(app: &Application, request: &mut Request) -> Response {
    if request.header("x-request-id").is_none() {
        let request_id = generate_request_id();
        request.set_header("x-request-id", &request_id);
    }

    let mut response = match app.dispatch(request) {
        Ok(response) => response,
        Err(e) => {
            error!("Dispatch failed: {}", e);
            Response::json(r#"{"error": "Internal Server Error"}"#).with_status(500)
        }
    };

    if let Some(request_id) = request.header("x-request-id") {
        response.set_header("x-request-id", request_id);
    }
    response
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    app: &Application,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> std::result::Result<hyper::Response<Full<Bytes>>, hyper::Error> {
    let mut request = match Request::from_hyper_with_limit(req, max_body_size).await {
        Ok(r) => r,
        Err(e) => match e {
            Error::PayloadTooLarge { .. } => {
                return Ok(Response::text("Payload Too Large")
                    .with_status(StatusCode::PAYLOAD_TOO_LARGE.as_u16())
                    .into_hyper());
            }
            _ => {
                error!("Failed to parse request: {}", e);
                return Ok(Response::text("Bad Request")
                    .with_status(StatusCode::BAD_REQUEST.as_u16())
                    .into_hyper());
            }
        },
    };

    request.set_header("x-client-ip", &remote_addr.ip().to_string());
    Ok(dispatch_or_500(app, &mut request).into_hyper())
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", now.as_nanos(), counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::route::{Action, ActionResult};

    fn test_server() -> Server {
        let mut app = Application::new(Container::new());
        app.get(
            "/ping",
            Action::Static(ActionResult::Text("pong".to_string())),
        );
        Server::new(app)
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 8000);
        assert!(config.keep_alive);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_dispatch_roundtrip() {
        let server = test_server();
        let response = server.test_dispatch(Method::Get, "/ping", HashMap::new(), None);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "pong");
    }

    #[test]
    fn test_dispatch_stamps_request_id() {
        let server = test_server();
        let response = server.test_dispatch(Method::Get, "/ping", HashMap::new(), None);
        assert!(response.header("x-request-id").is_some());
    }

    #[test]
    fn test_dispatch_miss_maps_to_status() {
        let server = test_server();
        let response = server.test_dispatch(Method::Get, "/nope", HashMap::new(), None);
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_oversized_body_rejected() {
        let mut app = Application::new(Container::new());
        app.post(
            "/upload",
            Action::Static(ActionResult::Text("ok".to_string())),
        );
        let mut server = Server::new(app);
        server.set_max_body_size(4);

        let response = server.test_dispatch(
            Method::Post,
            "/upload",
            HashMap::new(),
            Some(Bytes::from_static(b"way too large")),
        );
        assert_eq!(response.status, 413);
    }

    #[test]
    fn test_core_error_maps_to_500() {
        let mut app = Application::new(Container::new());
        // Unregistered controller type: dispatch fails inside the container.
        app.get("/broken", Action::controller("MissingController", "show"));
        let server = Server::new(app);

        let response = server.test_dispatch(Method::Get, "/broken", HashMap::new(), None);
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_bind_builder_sets_address() {
        let server = test_server().bind(([127, 0, 0, 1], 9099).into());
        assert_eq!(server.config.address.port(), 9099);
    }

    #[test]
    fn test_serve_reports_bind_conflict() {
        // Hold the port with a plain listener so serve() cannot take it.
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        tokio_test::block_on(async {
            let server = test_server().bind(addr);
            let err = server.serve().await.unwrap_err();
            assert!(matches!(err, Error::Bind { .. }));
        });
    }
}
