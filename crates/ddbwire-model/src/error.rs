//! DynamoDB service errors.
//!
//! Error responses are JSON objects with a `__type` field holding the
//! fully-qualified error type (`com.amazonaws.dynamodb.v20120810#Code`) and a
//! `message` (sometimes `Message`) field.

use std::fmt;

use serde::Deserialize;

/// Well-known DynamoDB error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Table already exists or is being modified.
    ResourceInUseException,
    /// Table or index not found.
    ResourceNotFoundException,
    /// Condition check failed.
    ConditionalCheckFailedException,
    /// Transaction canceled.
    TransactionCanceledException,
    /// Transaction conflict.
    TransactionConflictException,
    /// Item collection size limit exceeded.
    ItemCollectionSizeLimitExceededException,
    /// Provisioned throughput exceeded.
    ProvisionedThroughputExceededException,
    /// Generic throttling.
    ThrottlingException,
    /// Account-level request limit exceeded.
    RequestLimitExceeded,
    /// Control-plane limit exceeded.
    LimitExceededException,
    /// Validation error.
    ValidationException,
    /// Serialization error.
    SerializationException,
    /// Internal server error.
    InternalServerError,
    /// Service unavailable.
    ServiceUnavailable,
    /// Access denied.
    AccessDeniedException,
    /// Unknown access key or bad signature.
    UnrecognizedClientException,
    /// Session token expired.
    ExpiredTokenException,
    /// Anything not listed above.
    Unknown,
}

impl ErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceInUseException => "ResourceInUseException",
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ConditionalCheckFailedException => "ConditionalCheckFailedException",
            Self::TransactionCanceledException => "TransactionCanceledException",
            Self::TransactionConflictException => "TransactionConflictException",
            Self::ItemCollectionSizeLimitExceededException => {
                "ItemCollectionSizeLimitExceededException"
            }
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::ThrottlingException => "ThrottlingException",
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::LimitExceededException => "LimitExceededException",
            Self::ValidationException => "ValidationException",
            Self::SerializationException => "SerializationException",
            Self::InternalServerError => "InternalServerError",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::AccessDeniedException => "AccessDeniedException",
            Self::UnrecognizedClientException => "UnrecognizedClientException",
            Self::ExpiredTokenException => "ExpiredTokenException",
            Self::Unknown => "Unknown",
        }
    }

    /// Parses the code out of a `__type` value. Accepts both the qualified
    /// (`prefix#Code`) and bare forms.
    #[must_use]
    pub fn from_type(error_type: &str) -> Self {
        let code = error_type.rsplit('#').next().unwrap_or(error_type);
        match code {
            "ResourceInUseException" => Self::ResourceInUseException,
            "ResourceNotFoundException" => Self::ResourceNotFoundException,
            "ConditionalCheckFailedException" => Self::ConditionalCheckFailedException,
            "TransactionCanceledException" => Self::TransactionCanceledException,
            "TransactionConflictException" => Self::TransactionConflictException,
            "ItemCollectionSizeLimitExceededException" => {
                Self::ItemCollectionSizeLimitExceededException
            }
            "ProvisionedThroughputExceededException" => {
                Self::ProvisionedThroughputExceededException
            }
            "ThrottlingException" => Self::ThrottlingException,
            "RequestLimitExceeded" => Self::RequestLimitExceeded,
            "LimitExceededException" => Self::LimitExceededException,
            "ValidationException" => Self::ValidationException,
            "SerializationException" => Self::SerializationException,
            "InternalServerError" => Self::InternalServerError,
            "ServiceUnavailable" => Self::ServiceUnavailable,
            "AccessDeniedException" => Self::AccessDeniedException,
            "UnrecognizedClientException" => Self::UnrecognizedClientException,
            "ExpiredTokenException" => Self::ExpiredTokenException,
            _ => Self::Unknown,
        }
    }

    /// The request was rejected for rate reasons.
    #[must_use]
    pub fn is_throttling(&self) -> bool {
        matches!(
            self,
            Self::ProvisionedThroughputExceededException
                | Self::ThrottlingException
                | Self::RequestLimitExceeded
                | Self::LimitExceededException
        )
    }

    /// The service failed on its side and the same request may succeed later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::InternalServerError | Self::ServiceUnavailable | Self::TransactionConflictException
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error response returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// Parsed error code.
    pub code: ErrorCode,
    /// The raw `__type` string, empty if the body carried none.
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
    /// HTTP status of the response.
    pub status: http::StatusCode,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl ServiceError {
    /// Builds a service error from a non-2xx response. A body that is not a
    /// JSON error document still yields an error with an `Unknown` code.
    #[must_use]
    pub fn from_response(status: http::StatusCode, body: &[u8]) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
        let (error_type, message) = match parsed {
            Some(b) => (b.error_type, b.message),
            None => (String::new(), String::from_utf8_lossy(body).into_owned()),
        };
        Self {
            code: ErrorCode::from_type(&error_type),
            error_type,
            message,
            status,
        }
    }

    /// Throttled, or failed on the service side (including any 5xx).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.code.is_throttling() || self.code.is_transient() || self.status.is_server_error()
    }

    /// The request was signed with an expired session token.
    #[must_use]
    pub fn is_expired_token(&self) -> bool {
        self.code == ErrorCode::ExpiredTokenException
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ServiceError {}
