//! Transport abstraction: the engine's seam to the network.
//!
//! The pipeline builds a [`Request`], hands it to a [`Transport`]
//! together with the run's cancellation token, and receives a
//! [`Response`] or a taxonomy error. Production uses [`HttpTransport`]
//! over reqwest; tests script a mock.

use crate::cancellation::CancellationToken;
use crate::errors::UplinkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP methods the engine resolves from configuration or markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET - collected data travels in the query string.
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// All methods, in attribute-resolution order.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Returns the uppercase method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns the lowercase name used in attribute suffixes.
    #[must_use]
    pub fn attr_name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// Parses a method name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The HTTP method.
    pub method: Method,
    /// The resolved URL, query string included.
    pub url: String,
    /// Headers, keyed lowercase.
    pub headers: BTreeMap<String, String>,
    /// The serialized body, if any.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a bodyless request.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Sets a header (lowercased key).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }
}

/// A transport response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The status text; empty when the transport had none.
    pub status_text: String,
    /// Headers, keyed lowercase.
    pub headers: BTreeMap<String, String>,
    /// The raw body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response with a status and body.
    #[must_use]
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body,
        }
    }

    /// Sets the status text.
    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Sets a header (lowercased key).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns the content type, or an empty string.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body decoded as UTF-8, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The engine's network seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request, observing the cancellation token.
    ///
    /// A cancelled call must settle with an `Aborted` error rather than
    /// hanging or panicking.
    async fn send(
        &self,
        request: &Request,
        cancellation: &CancellationToken,
    ) -> Result<Response, UplinkError>;
}

/// Production transport over a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &Request) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &Request,
        cancellation: &CancellationToken,
    ) -> Result<Response, UplinkError> {
        let builder = self.build(request);

        let response = tokio::select! {
            result = builder.send() => {
                result.map_err(|e| UplinkError::network(e.to_string()))?
            }
            () = cancellation.cancelled() => {
                return Err(UplinkError::aborted(
                    cancellation.reason().unwrap_or_else(|| "cancelled".to_string()),
                ));
            }
        };

        let status = response.status();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }

        let body = tokio::select! {
            result = response.bytes() => {
                result.map_err(|e| UplinkError::network(e.to_string()))?.to_vec()
            }
            () = cancellation.cancelled() => {
                return Err(UplinkError::aborted(
                    cancellation.reason().unwrap_or_else(|| "cancelled".to_string()),
                ));
            }
        };

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("patch"), Some(Method::Patch));
        assert_eq!(Method::parse("head"), None);
    }

    #[test]
    fn test_request_headers_case_insensitive() {
        let mut request = Request::new(Method::Post, "/api/items");
        request.set_header("Content-Type", "application/json");
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_response_helpers() {
        let response = Response::new(204, Vec::new()).with_status_text("No Content");
        assert!(response.is_success());
        assert_eq!(response.status_text, "No Content");

        let response = Response::new(404, b"missing".to_vec());
        assert!(!response.is_success());
        assert_eq!(response.text(), "missing");
    }

    #[test]
    fn test_response_content_type_default_empty() {
        let response = Response::new(200, Vec::new());
        assert_eq!(response.content_type(), "");

        let response = response.with_header("Content-Type", "text/html");
        assert_eq!(response.content_type(), "text/html");
    }
}
