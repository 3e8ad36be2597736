//! # Application
//!
//! Facade tying the container, route table and middleware pipeline together.
//! Registration happens at startup; after that the application is immutable
//! and a dispatch is one synchronous pass: middleware chain in registration
//! order, router as the terminal handler, response unwinding back out.

use crate::container::Container;
use crate::error::Result;
use crate::middleware::{Middleware, MiddlewareDispatcher};
use crate::request::Request;
use crate::response::Response;
use crate::route::Action;
use crate::router::{Method, RouteTable, Router};
use std::sync::Arc;

/// The assembled request-processing core
pub struct Application {
    container: Arc<Container>,
    router: Router,
    middlewares: MiddlewareDispatcher,
}

impl Application {
    /// Create an application around a populated container
    #[must_use]
    pub fn new(container: Container) -> Self {
        let container = Arc::new(container);
        Self {
            router: Router::new(Arc::clone(&container)),
            container,
            middlewares: MiddlewareDispatcher::new(),
        }
    }

    /// The application container
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// The registered routes
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        self.router.table()
    }

    /// Register a route
    pub fn add(&mut self, method: Method, path: impl Into<String>, action: Action) {
        self.router.add(method, path, action);
    }

    /// Register a GET route
    pub fn get(&mut self, path: impl Into<String>, action: Action) {
        self.router.get(path, action);
    }

    /// Register a POST route
    pub fn post(&mut self, path: impl Into<String>, action: Action) {
        self.router.post(path, action);
    }

    /// Append a middleware to the pipeline
    pub fn add_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.add(middleware);
    }

    /// Run a request through the pipeline and router
    ///
    /// # Errors
    ///
    /// Propagates middleware, container and action failures; route misses
    /// are ordinary 404/405 responses, not errors
    pub fn dispatch(&self, request: &Request) -> Result<Response> {
        self.middlewares.dispatch(request, &self.router)
    }
}
