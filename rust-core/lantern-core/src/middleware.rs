//! # Middleware Pipeline
//!
//! Ordered request interceptors around a terminal handler. Each middleware
//! receives the request plus the rest of the chain and must either produce a
//! response itself (short-circuiting) or delegate with `next.handle(..)` and
//! optionally post-process the result.
//!
//! The chain is assembled fresh on every dispatch and discarded afterwards;
//! the first-added middleware runs outermost. A middleware returning `None`
//! broke the contract (no response produced, chain never invoked) and turns
//! into a fatal [`Error::UnhandledMiddleware`].

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::{info, warn};

/// A handler the chain can delegate to: the router, the default responder,
/// or the remainder of the middleware chain itself
pub trait RequestHandler: Send + Sync {
    /// Produce a response for the request
    ///
    /// # Errors
    ///
    /// Propagates dispatch failures
    fn handle(&self, request: &Request) -> Result<Response>;
}

/// Terminal handler used when no router is configured
///
/// Answers every request with an empty 204.
#[derive(Debug, Default)]
pub struct NoContentHandler;

impl RequestHandler for NoContentHandler {
    fn handle(&self, _request: &Request) -> Result<Response> {
        Ok(Response::empty(204))
    }
}

/// A request interceptor
pub trait Middleware: Send + Sync {
    /// Process the request, either responding directly or delegating
    ///
    /// Returning `Ok(None)` is a contract violation reported by the
    /// dispatcher.
    ///
    /// # Errors
    ///
    /// Propagates failures from the rest of the chain
    fn process(&self, request: &Request, next: &dyn RequestHandler) -> Result<Option<Response>>;

    /// Middleware name for logging and error reporting
    fn name(&self) -> &'static str {
        "Middleware"
    }
}

/// Ordered middleware pipeline
///
/// Append-only: middlewares execute in registration order, outermost first.
#[derive(Default)]
pub struct MiddlewareDispatcher {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareDispatcher {
    /// Create an empty dispatcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the chain
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Number of registered middlewares
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Check if the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Thread a request through the chain into the given terminal handler
    ///
    /// # Errors
    ///
    /// [`Error::UnhandledMiddleware`] when a middleware produces no
    /// response; otherwise whatever the chain propagates
    pub fn dispatch(&self, request: &Request, terminal: &dyn RequestHandler) -> Result<Response> {
        let chain = Chain {
            stack: &self.middlewares,
            terminal,
        };
        chain.handle(request)
    }

    /// Dispatch against the default no-content terminal
    ///
    /// # Errors
    ///
    /// Same as [`dispatch`](Self::dispatch)
    pub fn dispatch_default(&self, request: &Request) -> Result<Response> {
        self.dispatch(request, &NoContentHandler)
    }
}

/// The not-yet-run tail of the pipeline, handed to each middleware as "next"
struct Chain<'a> {
    stack: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn RequestHandler,
}

impl RequestHandler for Chain<'_> {
    fn handle(&self, request: &Request) -> Result<Response> {
        match self.stack.split_first() {
            None => self.terminal.handle(request),
            Some((current, rest)) => {
                let next = Chain {
                    stack: rest,
                    terminal: self.terminal,
                };
                match current.process(request, &next)? {
                    Some(response) => Ok(response),
                    None => Err(Error::UnhandledMiddleware {
                        middleware: current.name().to_string(),
                    }),
                }
            }
        }
    }
}

/// Logging middleware, emits one line per request and response
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Create a new logging middleware
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn process(&self, request: &Request, next: &dyn RequestHandler) -> Result<Option<Response>> {
        info!(
            method = %request.method,
            path = %request.path,
            "Request received"
        );
        let response = next.handle(request)?;
        info!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "Response sent"
        );
        Ok(Some(response))
    }

    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }
}

/// Authentication configuration (JWT)
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT decoding key
    pub decoding_key: DecodingKey,
    /// JWT validation settings
    pub validation: Validation,
}

impl AuthConfig {
    /// Create auth config from a shared secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

/// Bearer-token authentication middleware
///
/// Short-circuits with 401 unless the request carries a valid
/// `Authorization: Bearer <jwt>` header.
pub struct AuthMiddleware {
    config: AuthConfig,
}

impl AuthMiddleware {
    /// Create an auth middleware from a shared secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            config: AuthConfig::new(secret),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn process(&self, request: &Request, next: &dyn RequestHandler) -> Result<Option<Response>> {
        let token = request
            .header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Ok(Some(unauthorized(
                r#"{"error":"Missing or invalid Authorization header"}"#,
            )));
        };

        match decode::<serde_json::Value>(token, &self.config.decoding_key, &self.config.validation)
        {
            Ok(_) => next.handle(request).map(Some),
            Err(e) => {
                warn!("JWT validation failed: {}", e);
                Ok(Some(unauthorized(r#"{"error":"Unauthorized"}"#)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "AuthMiddleware"
    }
}

fn unauthorized(body: &str) -> Response {
    Response::json(body).with_status(401)
}

/// CORS middleware, stamps Cross-Origin Resource Sharing headers onto the
/// delegated response
#[derive(Clone)]
pub struct CorsMiddleware {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, PATCH, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
        }
    }
}

impl CorsMiddleware {
    /// Create a new CORS middleware with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set allowed origin
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    /// Set allowed methods
    #[must_use]
    pub fn allow_methods(mut self, methods: impl Into<String>) -> Self {
        self.allow_methods = methods.into();
        self
    }

    /// Set allowed headers
    #[must_use]
    pub fn allow_headers(mut self, headers: impl Into<String>) -> Self {
        self.allow_headers = headers.into();
        self
    }
}

impl Middleware for CorsMiddleware {
    fn process(&self, request: &Request, next: &dyn RequestHandler) -> Result<Option<Response>> {
        let mut response = next.handle(request)?;
        response.set_header("Access-Control-Allow-Origin", &self.allow_origin);
        response.set_header("Access-Control-Allow-Methods", &self.allow_methods);
        response.set_header("Access-Control-Allow-Headers", &self.allow_headers);
        Ok(Some(response))
    }

    fn name(&self) -> &'static str {
        "CorsMiddleware"
    }
}
