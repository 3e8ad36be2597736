//! # Error Handling
//!
//! Centralized error types for Lantern core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Route misses are not represented here: a path that matches no route (404)
//! or only routes with a different verb (405) is ordinary control flow and
//! produces a well-formed response. The variants below are programmer or
//! configuration errors and propagate out of `dispatch`/`handle`.

use thiserror::Error;

/// Result type alias for Lantern operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Lantern runtime
#[derive(Error, Debug)]
pub enum Error {
    /// A container key was bound a second time
    #[error("Key already bound in container: {key}")]
    DuplicateBinding {
        /// The key that was bound twice
        key: String,
    },

    /// A service key was looked up but never bound
    #[error("Container has no binding for: {key}")]
    NotFound {
        /// The unknown key
        key: String,
    },

    /// No supplied object, configuration or binding satisfies a parameter
    #[error("Cannot resolve dependency: {key}")]
    DependencyNotFound {
        /// The declared parameter type key
        key: String,
    },

    /// A disallowed value was bound or a constructed value had the wrong shape
    #[error("Invalid service for key {key}: {reason}")]
    InvalidService {
        /// The offending key
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A controller method was missing or not externally callable
    #[error("Method '{method}' is not accessible on controller '{controller}'")]
    MethodNotAccessible {
        /// The controller type key
        controller: String,
        /// The requested method name
        method: String,
    },

    /// A middleware neither produced a response nor delegated to the chain
    #[error("Middleware '{middleware}' produced no response and did not call next")]
    UnhandledMiddleware {
        /// Name of the offending middleware
        middleware: String,
    },

    /// Recursive construction revisited a type already being built
    #[error("Circular dependency while constructing: {key}")]
    CircularDependency {
        /// The key that closed the cycle
        key: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Response status code outside the valid range
    #[error("Invalid status code {code}; must be between 100 and 599, inclusive")]
    InvalidStatus {
        /// The rejected code
        code: u16,
    },

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },

    /// JSON encode/decode failure
    #[error("Serialization error: {reason}")]
    Serialization {
        /// What went wrong
        reason: String,
    },

    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    Bind {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_binding_message() {
        let err = Error::DuplicateBinding {
            key: "clock".to_string(),
        };
        assert!(err.to_string().contains("clock"));
    }

    #[test]
    fn test_method_not_accessible_message() {
        let err = Error::MethodNotAccessible {
            controller: "GreetingController".to_string(),
            method: "hidden".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GreetingController"));
        assert!(msg.contains("hidden"));
    }

    #[test]
    fn test_bind_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = Error::Bind {
            address: "0.0.0.0:8000".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("0.0.0.0:8000"));
    }
}
