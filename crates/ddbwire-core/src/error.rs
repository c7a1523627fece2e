//! Client error type.

use std::time::Duration;

use ddbwire_auth::AuthError;
use ddbwire_http::TransportError;
use ddbwire_model::{CodecError, ErrorCode, ServiceError};

use crate::expression::ExpressionError;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service rejected the request.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response or item could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// An expression could not be compiled.
    #[error("invalid expression: {0}")]
    Expression(#[from] ExpressionError),

    /// Credentials could not be resolved or a request could not be signed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// No credential source produced a key.
    #[error("no credentials available")]
    NoCredentials,

    /// A key or item with no attributes.
    #[error("item or key must not be empty")]
    EmptyItem,

    /// A request body could not be built.
    #[error("failed to build request: {0}")]
    Request(String),

    /// Retries were abandoned because the time budget ran out.
    #[error("gave up after {attempts} attempts in {elapsed:?} (budget {budget:?}): {last}")]
    Timeout {
        /// Attempts made, including the first.
        attempts: u32,
        /// Time spent across all attempts.
        elapsed: Duration,
        /// Configured time budget.
        budget: Duration,
        /// The last retryable failure observed.
        last: Box<Error>,
    },
}

impl Error {
    fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Service(e) => Some(e.code),
            _ => None,
        }
    }

    /// A condition expression evaluated to false.
    #[must_use]
    pub fn is_conditional_check_failed(&self) -> bool {
        self.code() == Some(ErrorCode::ConditionalCheckFailedException)
    }

    /// The table or index does not exist.
    #[must_use]
    pub fn is_resource_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::ResourceNotFoundException)
    }

    /// The service throttled the request.
    #[must_use]
    pub fn is_throttling(&self) -> bool {
        self.code().is_some_and(|code| code.is_throttling())
    }

    /// Another attempt of the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service(e) => e.is_retryable(),
            Self::Transport(_) => true,
            _ => false,
        }
    }

    /// The retry budget ran out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(CodecError::Json(e))
    }
}
