//! HTTP transport for the A2A JSON-RPC endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::task::Task;

/// Identity header attached to every request when a token is configured.
pub const IDENTITY_TOKEN_HEADER: &str = "X-Molty-Identity-Token";
/// Advertises which protocol extensions this client understands.
pub const EXTENSIONS_HEADER: &str = "X-A2A-Extensions";

/// Errors from talking to the A2A endpoint.
#[derive(Debug, thiserror::Error)]
pub enum A2aError {
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode server response: {0}")]
    Decode(serde_json::Error),
    #[error("server error: {0}")]
    Rpc(JsonRpcError),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("server returned an empty response")]
    EmptyResponse,
}

/// Outcome of a single JSON-RPC call.
///
/// A 402 response is not a failure: it carries the payment requirements the
/// caller needs to retry the call with a signed payment attached.
#[derive(Debug)]
pub enum CallResult {
    Task(Task),
    PaymentRequired(serde_json::Value),
}

/// Client for a molty resource server's `/a2a` endpoint.
#[derive(Debug, Clone)]
pub struct A2aClient {
    endpoint: Url,
    identity_token: Option<String>,
    extensions: Vec<String>,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl A2aClient {
    /// Builds a client for the server at `base_url`. The JSON-RPC endpoint
    /// lives at `{base_url}/a2a`.
    pub fn new(base_url: &str, identity_token: Option<String>) -> Result<Self, A2aError> {
        let base: Url = base_url.parse()?;
        // Url::join drops the last path segment unless the base ends in '/'.
        let endpoint = if base.path().ends_with('/') {
            base.join("a2a")?
        } else {
            format!("{base_url}/a2a").parse()?
        };
        Ok(Self {
            endpoint,
            identity_token: identity_token.filter(|t| !t.is_empty()),
            extensions: Vec::new(),
            http: reqwest::Client::new(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Advertises protocol extensions via the `X-A2A-Extensions` header.
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        self.extensions.extend(extensions);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Performs one JSON-RPC call and decodes the result into a [`Task`].
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<CallResult, A2aError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        tracing::debug!(%method, id, endpoint = %self.endpoint, "a2a request");

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&request);
        if let Some(token) = &self.identity_token {
            builder = builder.header(IDENTITY_TOKEN_HEADER, token);
        }
        if !self.extensions.is_empty() {
            builder = builder.header(EXTENSIONS_HEADER, self.extensions.join(", "));
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::PAYMENT_REQUIRED {
            let requirements = serde_json::from_str(&body).map_err(A2aError::Decode)?;
            return Ok(CallResult::PaymentRequired(requirements));
        }
        if !status.is_success() {
            return Err(A2aError::Status { status, body });
        }

        let envelope: JsonRpcResponse = serde_json::from_str(&body).map_err(A2aError::Decode)?;
        let result = envelope
            .into_result()
            .map_err(A2aError::Rpc)?
            .ok_or(A2aError::EmptyResponse)?;
        let task: Task = serde_json::from_value(result).map_err(A2aError::Decode)?;
        tracing::debug!(id, state = %task.state(), "a2a response");
        Ok(CallResult::Task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_returning(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a2a"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn posts_jsonrpc_envelope_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a2a"))
            .and(header("content-type", "application/json"))
            .and(header(IDENTITY_TOKEN_HEADER, "tok-123"))
            .and(header(EXTENSIONS_HEADER, "https://example.com/ext/v1"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "gig.list",
                "params": {}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "id": "t-1", "status": { "state": "completed" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = A2aClient::new(&server.uri(), Some("tok-123".into()))
            .unwrap()
            .with_extensions(["https://example.com/ext/v1".to_string()]);
        let result = client.call("gig.list", json!({})).await.unwrap();
        match result {
            CallResult::Task(task) => assert_eq!(task.id.as_deref(), Some("t-1")),
            other => panic!("expected task, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_402_surfaces_payment_requirements() {
        let server = server_returning(ResponseTemplate::new(402).set_body_json(json!({
            "x402Version": 1,
            "accepts": []
        })))
        .await;

        let client = A2aClient::new(&server.uri(), None).unwrap();
        let result = client.call("message/send", json!({})).await.unwrap();
        match result {
            CallResult::PaymentRequired(value) => assert_eq!(value["x402Version"], 1),
            other => panic!("expected payment required, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rpc_error_envelope_becomes_error() {
        let server = server_returning(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32001, "message": "gig not found" }
        })))
        .await;

        let client = A2aClient::new(&server.uri(), None).unwrap();
        let err = client.call("gig.get", json!({"gigId": "g-404"})).await.unwrap_err();
        assert!(matches!(err, A2aError::Rpc(ref e) if e.message == "gig not found"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = server_returning(ResponseTemplate::new(500).set_body_string("boom")).await;

        let client = A2aClient::new(&server.uri(), None).unwrap();
        let err = client.call("gig.list", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            A2aError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn request_ids_increment_per_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"id": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": { "status": { "state": "completed" } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"id": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 2,
                "result": { "status": { "state": "completed" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = A2aClient::new(&server.uri(), None).unwrap();
        client.call("gig.list", json!({})).await.unwrap();
        client.call("gig.list", json!({})).await.unwrap();
    }
}
