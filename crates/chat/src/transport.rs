//! HTTP request/response boundary.
//!
//! The protocol client only needs "issue request, await status + body". The
//! [`Transport`] trait keeps that seam narrow so tests can script responses.

use std::time::Duration;

use {
    async_trait::async_trait,
    tracing::{debug, trace},
};

use crate::{Error, Result};

/// HTTP method subset used by the chat backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request against the chat backend or any external API a plugin calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub method: Method,
    pub uri: String,
    /// `application/x-www-form-urlencoded` fields, POST only.
    pub form: Vec<(String, String)>,
}

impl ChatRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            uri: uri.into(),
            form: Vec::new(),
        }
    }

    pub fn post_form<K, V>(uri: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: Method::Post,
            uri: uri.into(),
            form: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a form field, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl From<&str> for ChatRequest {
    fn from(uri: &str) -> Self {
        Self::get(uri)
    }
}

impl From<String> for ChatRequest {
    fn from(uri: String) -> Self {
        Self::get(uri)
    }
}

/// Status and body of a completed HTTP exchange. Any status is surfaced as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub status: u16,
    pub body: String,
}

impl ChatResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generic asynchronous HTTP facility.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request. Fails only with [`Error::Transport`].
    async fn request(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with a per-request timeout. A zero timeout leaves
    /// requests unbounded.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport("building http client", e))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shares its connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!(method = ?request.method, uri = %request.uri, "http request");
        let builder = match request.method {
            Method::Get => self.client.get(&request.uri),
            Method::Post => self.client.post(&request.uri).form(&request.form),
        };
        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(format!("sending request to {}", request.uri), e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("reading response from {}", request.uri), e))?;
        trace!(status, body_len = body.len(), "http response");
        Ok(ChatResponse { status, body })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_from_uri_is_get() {
        let req: ChatRequest = "https://example.com/x".into();
        assert_eq!(req.method, Method::Get);
        assert!(req.form.is_empty());
    }

    #[test]
    fn post_form_collects_fields() {
        let req = ChatRequest::post_form("https://example.com", [("text", "hi"), ("fkey", "k")]);
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.field("text"), Some("hi"));
        assert_eq!(req.field("fkey"), Some("k"));
        assert_eq!(req.field("missing"), None);
    }

    #[tokio::test]
    async fn posts_form_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chats/11/messages/new")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("text".into(), "hello world".into()),
                mockito::Matcher::UrlEncoded("fkey".into(), "abc".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":42,"time":1234}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new("jeeves-test", Duration::from_secs(5)).unwrap();
        let req = ChatRequest::post_form(
            format!("{}/chats/11/messages/new", server.url()),
            [("text", "hello world"), ("fkey", "abc")],
        );
        let resp = transport.request(req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"{"id":42,"time":1234}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_error_status_as_is() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/message/7")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let transport = ReqwestTransport::new("jeeves-test", Duration::ZERO).unwrap();
        let resp = transport
            .request(format!("{}/message/7", server.url()).into())
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
        assert_eq!(resp.body, "not found");
    }

    #[tokio::test]
    async fn connection_failure_is_transport_error() {
        let transport = ReqwestTransport::new("jeeves-test", Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let err = transport
            .request("http://127.0.0.1:9/".into())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
