//! # Route Definition
//!
//! A route pairs an HTTP verb and a declarative path pattern with the action
//! to run on a match. Patterns use `{name}` placeholders, each standing for
//! exactly one path segment.
//!
//! Routes are immutable once registered. Matching compiles the pattern
//! lazily on every attempt and hands extracted captures back to the caller
//! in a request-owned [`ParamBag`]; nothing request-scoped is ever written
//! to the shared `Route`.

use crate::error::{Error, Result};
use crate::request::{ParamBag, Request};
use crate::response::Response;
use crate::router::Method;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Inline request handler bound directly to a route
pub type Callable = Arc<dyn Fn(&Request, &ParamBag) -> Result<ActionResult> + Send + Sync>;

/// Value produced by an action, before coercion into a [`Response`]
#[derive(Debug, Clone)]
pub enum ActionResult {
    /// A fully structured response, returned verbatim
    Response(Response),
    /// A plain string, wrapped into a 200 text response
    Text(String),
    /// A structured value, serialized to JSON and wrapped
    Value(serde_json::Value),
}

/// The unit of work bound to a route
///
/// Exhaustively matched at dispatch time; there is no runtime type sniffing
/// of the handler.
#[derive(Clone)]
pub enum Action {
    /// An inline callable invoked with the request and extracted parameters
    Callable(Callable),
    /// A constructible controller type plus a method name on it
    ControllerMethod {
        /// Container key of the controller type
        controller: String,
        /// Name of the method to invoke
        method: String,
    },
    /// A fixed value returned for every match
    Static(ActionResult),
}

impl Action {
    /// Wrap a closure as a callable action
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Request, &ParamBag) -> Result<ActionResult> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(f))
    }

    /// Reference a controller method as the action
    pub fn controller(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self::ControllerMethod {
            controller: controller.into(),
            method: method.into(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Action::Callable"),
            Self::ControllerMethod { controller, method } => f
                .debug_struct("Action::ControllerMethod")
                .field("controller", controller)
                .field("method", method)
                .finish(),
            Self::Static(value) => f.debug_tuple("Action::Static").field(value).finish(),
        }
    }
}

/// A registered (verb, path pattern, action) triple
#[derive(Debug, Clone)]
pub struct Route {
    /// The HTTP method accepted by the route
    pub method: Method,
    /// The route pattern (e.g., `/users/{id}`)
    pub path: String,
    /// The work to run when the route matches
    pub action: Action,
}

impl Route {
    /// Create a new route
    pub fn new(method: Method, path: impl Into<String>, action: Action) -> Self {
        Self {
            method,
            path: path.into(),
            action,
        }
    }

    /// Match a request path against this route's pattern
    ///
    /// Returns the extracted captures in pattern order, or `None` when the
    /// path does not match. The pattern is compiled on each call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRoutePattern`] when the pattern cannot be
    /// compiled (e.g. a placeholder name that is not a valid capture name)
    pub fn match_path(&self, path: &str) -> Result<Option<ParamBag>> {
        let regex = compile_pattern(&self.path)?;
        let Some(captures) = regex.captures(path) else {
            return Ok(None);
        };

        let mut params = ParamBag::new();
        for name in regex.capture_names().flatten() {
            if let Some(value) = captures.name(name) {
                params.set(name, value.as_str());
            }
        }
        Ok(Some(params))
    }
}

/// Compile a `{name}` pattern into an anchored regex
///
/// Each placeholder becomes a named single-segment capture (`[^/]+`); the
/// literal parts are escaped. An unterminated `{` is treated as literal
/// text.
fn compile_pattern(path: &str) -> Result<Regex> {
    let mut pattern = String::with_capacity(path.len() + 16);
    pattern.push('^');

    let mut rest = path;
    while let Some(open) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..open]));
        let tail = &rest[open + 1..];
        if let Some(close) = tail.find('}') {
            pattern.push_str("(?P<");
            pattern.push_str(&tail[..close]);
            pattern.push_str(">[^/]+)");
            rest = &tail[close + 1..];
        } else {
            pattern.push_str(&regex::escape(&rest[open..]));
            rest = "";
        }
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| Error::InvalidRoutePattern {
        pattern: path.to_string(),
        reason: e.to_string(),
    })
}
