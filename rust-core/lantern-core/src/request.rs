//! # HTTP Request
//!
//! Request wrapper with lazy query/form parsing, plus the request-scoped
//! parameter bag filled in by route matching.
//!
//! Extracted path captures never live on the registered route: they are
//! returned to the caller inside a [`ParamBag`] owned by the current request,
//! so concurrent requests matching the same route cannot observe each other.

use crate::error::{Error, Result};
use crate::router::Method;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::Request as HyperRequest;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Insertion-ordered mapping of named parameters for one match attempt.
///
/// Holds path captures first, then (for POST) form-body fields. Lives for a
/// single dispatch and is discarded with the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBag {
    entries: Vec<(String, String)>,
}

impl ParamBag {
    /// Create an empty bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, overwriting an existing value in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Get a parameter value by name
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a parameter is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Parameter values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    /// Iterate over (name, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// HTTP Request as consumed by the routing core
///
/// Carries the verb, path, ordered headers and the collected body. How the
/// value was parsed off the wire is the transport adapter's concern; the core
/// only ever sees a fully constructed `Request`.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Raw query string (e.g., "page=1&limit=10")
    query_string: Option<String>,
    /// Parsed query parameters
    query_params: HashMap<String, String>,
    /// Request headers
    headers: hyper::HeaderMap,
    /// Request body (collected)
    body: Option<Bytes>,
}

impl Request {
    /// Create a new Request manually (for testing/internal use)
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers_map: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Self {
        let path = path.into();
        let (path, query_string) = if let Some((p, q)) = path.split_once('?') {
            (p.to_string(), Some(q.to_string()))
        } else {
            (path, None)
        };

        let query_params = parse_urlencoded(query_string.as_deref());

        let mut headers = hyper::HeaderMap::new();
        for (k, v) in headers_map {
            if let (Ok(n), Ok(v)) = (
                hyper::header::HeaderName::from_bytes(k.as_bytes()),
                hyper::header::HeaderValue::from_str(&v),
            ) {
                headers.insert(n, v);
            }
        }

        Self {
            method,
            path,
            query_string,
            query_params,
            headers,
            body,
        }
    }

    /// Create from a hyper request, collecting the body
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the body exceeds the limit
    pub async fn from_hyper_with_limit(
        req: HyperRequest<hyper::body::Incoming>,
        max_body_size: usize,
    ) -> Result<Self> {
        let method = Method::from_hyper(req.method());

        let uri = req.uri();
        let path = uri.path().to_string();
        let query_string = uri.query().map(String::from);
        let query_params = parse_urlencoded(query_string.as_deref());

        let headers = req.headers().clone();
        if let Some(len) = headers.get(hyper::header::CONTENT_LENGTH) {
            if let Ok(content_len) = len.to_str().unwrap_or("").parse::<usize>() {
                if content_len > max_body_size {
                    return Err(Error::PayloadTooLarge {
                        limit: max_body_size,
                        actual: content_len,
                    });
                }
            }
        }

        let body = match BodyExt::collect(req.into_body()).await {
            Ok(collected) => {
                let bytes = collected.to_bytes();
                if bytes.len() > max_body_size {
                    return Err(Error::PayloadTooLarge {
                        limit: max_body_size,
                        actual: bytes.len(),
                    });
                }
                Some(bytes)
            }
            Err(_) => None,
        };

        Ok(Self {
            method,
            path,
            query_string,
            query_params,
            headers,
            body,
        })
    }

    /// Create from a hyper request without a body limit
    ///
    /// # Errors
    ///
    /// Propagates body collection failures
    pub async fn from_hyper(req: HyperRequest<hyper::body::Incoming>) -> Result<Self> {
        Self::from_hyper_with_limit(req, usize::MAX).await
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set or override a header
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            hyper::header::HeaderName::from_bytes(name.as_bytes()),
            hyper::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// Get the underlying ordered header map
    #[must_use]
    pub fn headers(&self) -> &hyper::HeaderMap {
        &self.headers
    }

    /// Get query parameters
    #[must_use]
    pub fn query_map(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Get raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Get the request body as bytes
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_ref().map(AsRef::as_ref)
    }

    /// Get the request body as string (UTF-8)
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.body_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Parse the request body as JSON
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the body is absent or malformed
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self.body_str() {
            Some(s) => crate::json::parse_json(s),
            None => Err(Error::Serialization {
                reason: "request has no body".to_string(),
            }),
        }
    }

    /// Parse urlencoded form fields from the request body
    ///
    /// Returns an empty map unless the content type is
    /// `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn form_fields(&self) -> HashMap<String, String> {
        self.form_pairs().into_iter().collect()
    }

    /// Form fields in body order, for order-sensitive merging
    ///
    /// Duplicate keys are kept; consumers applying them through
    /// [`ParamBag::set`] get last-value-wins semantics.
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let is_form = self
            .header("content-type")
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if !is_form {
            return Vec::new();
        }

        parse_pairs(self.body_str())
    }
}

/// Parse an urlencoded key-value string into a map
///
/// Handles URL decoding and duplicate keys (last value wins). Shared by the
/// query-string and form-body paths.
fn parse_urlencoded(input: Option<&str>) -> HashMap<String, String> {
    parse_pairs(input).into_iter().collect()
}

/// Parse an urlencoded key-value string, preserving pair order
fn parse_pairs(input: Option<&str>) -> Vec<(String, String)> {
    input
        .map(|q| {
            q.split('&')
                .filter(|pair| !pair.is_empty())
                .filter_map(|pair| {
                    let mut parts = pair.splitn(2, '=');
                    let key = parts.next()?;
                    let value = parts.next().unwrap_or("");
                    Some((url_decode(key), url_decode(value)))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Basic URL decoding
fn url_decode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '+' => result.push(' '),
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() == 2 {
                    if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                        result.push(byte as char);
                    } else {
                        result.push('%');
                        result.push_str(&hex);
                    }
                } else {
                    result.push('%');
                    result.push_str(&hex);
                }
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_bag_order_preserved() {
        let mut bag = ParamBag::new();
        bag.set("id", "42");
        bag.set("name", "ada");
        bag.set("page", "3");

        let keys: Vec<&str> = bag.keys().collect();
        assert_eq!(keys, vec!["id", "name", "page"]);
    }

    #[test]
    fn test_param_bag_set_overwrites_in_place() {
        let mut bag = ParamBag::new();
        bag.set("id", "1");
        bag.set("name", "ada");
        bag.set("id", "2");

        assert_eq!(bag.get("id"), Some("2"));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.keys().next(), Some("id"));
    }

    #[test]
    fn test_param_bag_missing_key() {
        let bag = ParamBag::new();
        assert_eq!(bag.get("missing"), None);
        assert!(!bag.contains("missing"));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_parse_urlencoded_simple() {
        let result = parse_urlencoded(Some("page=1&limit=10"));
        assert_eq!(result.get("page"), Some(&"1".to_string()));
        assert_eq!(result.get("limit"), Some(&"10".to_string()));
    }

    #[test]
    fn test_parse_urlencoded_encoded() {
        let result = parse_urlencoded(Some("name=John+Doe&city=New%20York"));
        assert_eq!(result.get("name"), Some(&"John Doe".to_string()));
        assert_eq!(result.get("city"), Some(&"New York".to_string()));
    }

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("hello+world"), "hello world");
        assert_eq!(url_decode("hello%20world"), "hello world");
        assert_eq!(url_decode("100%25"), "100%");
    }

    #[test]
    fn test_request_splits_query_string() {
        let req = Request::new(Method::Get, "/users?page=2", HashMap::new(), None);
        assert_eq!(req.path, "/users");
        assert_eq!(req.query_string(), Some("page=2"));
        assert_eq!(req.query_map().get("page"), Some(&"2".to_string()));
    }

    #[test]
    fn test_request_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let req = Request::new(Method::Get, "/", headers, None);
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_form_fields_require_content_type() {
        let body = Bytes::from_static(b"name=ada&title=countess");
        let req = Request::new(Method::Post, "/users", HashMap::new(), Some(body.clone()));
        assert!(req.form_fields().is_empty());

        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        let req = Request::new(Method::Post, "/users", headers, Some(body));
        let fields = req.form_fields();
        assert_eq!(fields.get("name"), Some(&"ada".to_string()));
        assert_eq!(fields.get("title"), Some(&"countess".to_string()));
    }

    #[test]
    fn test_request_json_body() {
        let body = Bytes::from_static(br#"{"id": 7}"#);
        let req = Request::new(Method::Post, "/", HashMap::new(), Some(body));
        let value: serde_json::Value = req.json().unwrap();
        assert_eq!(value["id"], 7);
    }
}
