//! # HTTP Response
//!
//! Structured response produced by the routing core. Serializing it back to
//! the transport is the adapter's concern (`server` module).

use crate::error::{Error, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::StatusCode;
use std::collections::HashMap;

/// Minimum allowed status code value.
pub const MIN_STATUS_CODE: u16 = 100;

/// Maximum allowed status code value.
pub const MAX_STATUS_CODE: u16 = 599;

/// HTTP Response wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Content type
    pub content_type: String,
    /// Response headers
    pub headers: HashMap<String, String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: "application/json".to_string(),
            headers: HashMap::new(),
        }
    }
}

impl Response {
    /// Create an empty-bodied response with the given status
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            content_type: "text/plain".to_string(),
            headers: HashMap::new(),
        }
    }

    /// Create a JSON response
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "application/json".to_string(),
            headers: HashMap::new(),
        }
    }

    /// Create a text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "text/plain".to_string(),
            headers: HashMap::new(),
        }
    }

    /// Set status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set a header, builder style
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    /// Set or override a header
    pub fn set_header(&mut self, key: &str, value: &str) {
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type = value.to_string();
        } else {
            self.headers.insert(key.to_string(), value.to_string());
        }
    }

    /// Get a header value by name
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        if key.eq_ignore_ascii_case("content-type") {
            return Some(&self.content_type);
        }
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Reason phrase for the current status code
    #[must_use]
    pub fn reason_phrase(&self) -> &'static str {
        reason_phrase(self.status)
    }

    /// Check the status code is within the allowed 100-599 range
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStatus`] outside the range
    pub fn validate_status(&self) -> Result<()> {
        if !(MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&self.status) {
            return Err(Error::InvalidStatus { code: self.status });
        }
        Ok(())
    }

    /// Convert to a hyper response for the transport adapter
    #[must_use]
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = hyper::Response::builder().status(status);
        builder = builder.header("Content-Type", &self.content_type);
        for (k, v) in &self.headers {
            if !k.eq_ignore_ascii_case("content-type") {
                builder = builder.header(k.as_str(), v.as_str());
            }
        }

        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                hyper::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::from("Internal Server Error")))
                    .unwrap()
            })
    }
}

/// Reason phrase for a status code, empty for unassigned codes
#[must_use]
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        413 => "Content Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Content",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json() {
        let resp = Response::json(r#"{"status": "ok"}"#);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "application/json");
    }

    #[test]
    fn test_response_with_status() {
        let resp = Response::text("Not Found").with_status(404);
        assert_eq!(resp.status, 404);
        assert_eq!(resp.reason_phrase(), "Not Found");
    }

    #[test]
    fn test_empty_response_has_no_body() {
        let resp = Response::empty(405);
        assert!(resp.body.is_empty());
        assert_eq!(resp.status, 405);
    }

    #[test]
    fn test_content_type_header_routed_to_field() {
        let resp = Response::text("x").with_header("Content-Type", "text/html");
        assert_eq!(resp.content_type, "text/html");
        assert!(resp.headers.is_empty());
        assert_eq!(resp.header("content-type"), Some("text/html"));
    }

    #[test]
    fn test_validate_status_range() {
        assert!(Response::empty(100).validate_status().is_ok());
        assert!(Response::empty(599).validate_status().is_ok());
        assert!(Response::empty(99).validate_status().is_err());
        assert!(Response::empty(600).validate_status().is_err());
    }

    #[test]
    fn test_into_hyper_preserves_status_and_headers() {
        let resp = Response::json("{}")
            .with_status(201)
            .with_header("x-request-id", "abc");
        let hyper_resp = resp.into_hyper();
        assert_eq!(hyper_resp.status(), StatusCode::CREATED);
        assert_eq!(
            hyper_resp.headers().get("x-request-id").unwrap(),
            "abc"
        );
    }
}
