//! # Routing
//!
//! The route table stores registered routes in order and resolves a request
//! to the first route whose verb and path both match, while tracking the
//! fallback status (405 when only the verb differs, 404 when no pattern
//! matches at all). The router then runs the matched action, constructing
//! controllers through the dependency container.
//!
//! Status precedence is 200 > 405 > 404: a path-level match on a different
//! verb never shadows a full match, regardless of registration order.

use crate::container::{Container, Supplied};
use crate::error::{Error, Result};
use crate::middleware::RequestHandler;
use crate::request::{ParamBag, Request};
use crate::response::Response;
use crate::route::{Action, ActionResult, Route};
use std::sync::Arc;

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

impl Method {
    /// Convert from a hyper method, falling back to GET for extensions
    #[must_use]
    pub fn from_hyper(method: &hyper::Method) -> Self {
        match *method {
            hyper::Method::POST => Self::Post,
            hyper::Method::PUT => Self::Put,
            hyper::Method::DELETE => Self::Delete,
            hyper::Method::PATCH => Self::Patch,
            hyper::Method::HEAD => Self::Head,
            hyper::Method::OPTIONS => Self::Options,
            _ => Self::Get,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}

/// A request handler type the container can construct
///
/// Controllers expose their externally callable methods through [`call`];
/// an unknown method name returns `None` and surfaces to the router as
/// [`Error::MethodNotAccessible`].
///
/// [`call`]: Controller::call
pub trait Controller: Send + Sync {
    /// Invoke a named method with the request and extracted parameters
    fn call(
        &self,
        method: &str,
        request: &Request,
        params: &ParamBag,
    ) -> Option<Result<ActionResult>>;
}

/// Type-erase a controller for storage in the container
///
/// Controller factories return this so the router can downcast the
/// constructed service back to a callable controller.
pub fn controller_service(
    controller: impl Controller + 'static,
) -> crate::container::SharedService {
    Arc::new(Box::new(controller) as Box<dyn Controller>)
}

/// One resolved match: the route plus its request-owned parameters
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Path captures, then (for POST) form fields
    pub params: ParamBag,
}

/// Outcome of scanning the table for a request
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// 200 on a full match, 405 on a path-only match, 404 otherwise
    pub status: u16,
    /// The first route whose method and path both matched
    pub route: Option<RouteMatch<'a>>,
}

/// Ordered collection of registered routes
///
/// Append-only; duplicate method+path pairs are allowed and the earliest
/// registration wins at match time.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route
    pub fn add(&mut self, method: Method, path: impl Into<String>, action: Action) {
        self.routes.push(Route::new(method, path, action));
    }

    /// Convenience wrapper to register a GET route
    pub fn get(&mut self, path: impl Into<String>, action: Action) {
        self.add(Method::Get, path, action);
    }

    /// Convenience wrapper to register a POST route
    pub fn post(&mut self, path: impl Into<String>, action: Action) {
        self.add(Method::Post, path, action);
    }

    /// Registered routes in registration order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Scan the table for the given request
    ///
    /// Single pass in registration order. A route whose path matches records
    /// at least a 405; the first route whose method also matches is kept and
    /// fixes the status at 200. Nothing matching any path leaves 404.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::InvalidRoutePattern`] from pattern compilation
    pub fn find<'a>(&'a self, request: &Request) -> Result<MatchResult<'a>> {
        let mut status: u16 = 404;
        let mut matched: Option<RouteMatch<'a>> = None;

        for route in &self.routes {
            let Some(params) = route.match_path(&request.path)? else {
                continue;
            };

            if route.method == request.method {
                if matched.is_none() {
                    status = 200;
                    matched = Some(RouteMatch {
                        route,
                        params: merge_request_fields(params, request),
                    });
                }
            } else if status != 200 {
                status = 405;
            }
        }

        Ok(MatchResult {
            status,
            route: matched,
        })
    }
}

/// Merge method-specific request fields into the extracted parameters
///
/// Path captures are set first and always win; POST form fields fill the
/// remaining names in body order.
fn merge_request_fields(mut params: ParamBag, request: &Request) -> ParamBag {
    if request.method != Method::Post {
        return params;
    }

    let capture_names: Vec<String> = params.keys().map(str::to_string).collect();
    for (key, value) in request.form_pairs() {
        if !capture_names.iter().any(|name| *name == key) {
            params.set(key, value);
        }
    }
    params
}

/// Dispatches a matched request to its action
///
/// Controller actions are instantiated through the container on every
/// dispatch, with the live request and parameter bag pre-supplied so
/// matching constructor dependencies resolve without explicit bindings.
pub struct Router {
    table: RouteTable,
    container: Arc<Container>,
}

impl Router {
    /// Create a router over an empty table
    #[must_use]
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            table: RouteTable::new(),
            container,
        }
    }

    /// Append a route
    pub fn add(&mut self, method: Method, path: impl Into<String>, action: Action) {
        self.table.add(method, path, action);
    }

    /// Convenience wrapper to register a GET route
    pub fn get(&mut self, path: impl Into<String>, action: Action) {
        self.table.get(path, action);
    }

    /// Convenience wrapper to register a POST route
    pub fn post(&mut self, path: impl Into<String>, action: Action) {
        self.table.post(path, action);
    }

    /// The underlying route table
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve and invoke the route for a request
    ///
    /// A miss is not an error: it yields an empty response carrying the
    /// computed 404/405 status.
    ///
    /// # Errors
    ///
    /// Propagates action, container and pattern errors
    pub fn handle(&self, request: &Request) -> Result<Response> {
        let result = self.table.find(request)?;

        let Some(found) = result.route else {
            return Ok(Response::empty(result.status));
        };

        let outcome = self.invoke(&found, request)?;
        coerce(outcome)
    }

    fn invoke(&self, found: &RouteMatch<'_>, request: &Request) -> Result<ActionResult> {
        match &found.route.action {
            Action::Callable(callable) => callable(request, &found.params),
            Action::Static(value) => Ok(value.clone()),
            Action::ControllerMethod { controller, method } => {
                let supplied = [
                    Supplied::new(request.clone()),
                    Supplied::new(found.params.clone()),
                ];
                let service = self.container.construct(controller, &supplied)?;
                let Some(instance) = service.downcast_ref::<Box<dyn Controller>>() else {
                    return Err(Error::InvalidService {
                        key: controller.clone(),
                        reason: "constructed value is not a controller".to_string(),
                    });
                };
                instance
                    .call(method, request, &found.params)
                    .ok_or_else(|| Error::MethodNotAccessible {
                        controller: controller.clone(),
                        method: method.clone(),
                    })?
            }
        }
    }
}

impl RequestHandler for Router {
    fn handle(&self, request: &Request) -> Result<Response> {
        Router::handle(self, request)
    }
}

/// Coerce an action result into a structured response
fn coerce(outcome: ActionResult) -> Result<Response> {
    match outcome {
        ActionResult::Response(response) => Ok(response),
        ActionResult::Text(body) => Ok(Response::text(body)),
        ActionResult::Value(value) => Ok(Response::json(crate::json::to_json_pretty(&value)?)),
    }
}
