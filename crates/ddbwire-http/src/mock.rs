//! Scripted in-memory transport.
//!
//! Replays queued responses in order and records every request it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::client::HttpClient;
use crate::error::TransportError;

/// A request as seen by [`MockHttpClient`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: http::Method,
    /// Full request URI.
    pub uri: http::Uri,
    /// Headers, including those added by the signer.
    pub headers: http::HeaderMap,
    /// Raw body.
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, `Null` if it is not JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    /// A header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

type Scripted = Result<http::Response<Bytes>, TransportError>;

/// [`HttpClient`] that answers from a queue. An empty queue yields a
/// transport error.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body.
    pub fn push_response(&self, status: http::StatusCode, body: impl Into<Bytes>) -> &Self {
        let mut response = http::Response::new(body.into());
        *response.status_mut() = status;
        self.script.lock().push_back(Ok(response));
        self
    }

    /// Queue a `200 OK` with a JSON body.
    pub fn push_json(&self, body: &serde_json::Value) -> &Self {
        self.push_response(http::StatusCode::OK, body.to_string())
    }

    /// Queue a DynamoDB-style error document.
    pub fn push_error(&self, status: http::StatusCode, code: &str, message: &str) -> &Self {
        let body = serde_json::json!({
            "__type": format!("com.amazonaws.dynamodb.v20120810#{code}"),
            "message": message,
        });
        self.push_response(status, body.to_string())
    }

    /// Queue a transport failure.
    pub fn push_failure(&self, error: TransportError) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of scripted answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        let (parts, body) = request.into_parts();
        self.requests.lock().push(RecordedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::other("no scripted response left")))
    }
}
