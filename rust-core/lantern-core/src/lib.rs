//! # Lantern Core
//!
//! Core runtime library for the Lantern framework: a route registry with
//! pattern matching, a middleware execution pipeline, and a dependency
//! container that instantiates request handlers.
//!
//! ## Architecture
//!
//! A request enters the middleware pipeline, which threads it through the
//! interceptors in registration order; the innermost continuation is the
//! router, which matches against the route table, resolves the handler's
//! dependencies through the container, invokes it, and returns a response
//! that unwinds back out through the middleware. One request is handled
//! synchronously within one call stack; the hyper server in `server` is the
//! async boundary.
//!
//! ## Modules
//!
//! - `app` - Application facade wiring container, routes and middleware
//! - `container` - Dependency container with an explicit factory registry
//! - `error` - Error types and handling
//! - `json` - High-performance JSON parsing with simd-json
//! - `middleware` - Continuation-style request interceptors
//! - `request` - HTTP request wrapper and the per-request parameter bag
//! - `response` - HTTP response with status validation
//! - `route` - Route definition and pattern compilation
//! - `router` - Route table scanning and action dispatch
//! - `server` - HTTP/1 transport adapter built on Hyper
//! - `session` - Thread-safe in-memory session store

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod container;
pub mod error;
pub mod json;
pub mod middleware;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod server;
pub mod session;

pub use app::Application;
pub use container::{service_key, Container, ServiceFactory, SharedService, Supplied};
pub use error::{Error, Result};
pub use json::{parse_json, to_json};
pub use middleware::{
    AuthConfig, AuthMiddleware, CorsMiddleware, LoggingMiddleware, Middleware,
    MiddlewareDispatcher, NoContentHandler, RequestHandler,
};
pub use request::{ParamBag, Request};
pub use response::Response;
pub use route::{Action, ActionResult, Route};
pub use router::{controller_service, Controller, MatchResult, Method, RouteMatch, RouteTable, Router};
pub use server::{Server, ServerConfig};
pub use session::SessionStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
///
/// JSON output, filtered through `RUST_LOG` with a sensible default.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "lantern_core=info"
                    .parse()
                    .expect("static directive always parses"),
            ),
        )
        .json()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_init_tracing_is_reentrant() {
        init_tracing();
        init_tracing();
    }
}
