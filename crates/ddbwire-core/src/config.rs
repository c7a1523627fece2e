//! Client configuration.

use std::env;
use std::time::Duration;

use crate::retry::{Backoff, Jitter, RetryConfig};

/// Region used when neither `AWS_REGION` nor `AWS_DEFAULT_REGION` is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// DynamoDB client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Region used for the default endpoint and the signing scope.
    pub region: String,
    /// Endpoint override, e.g. a local DynamoDB-compatible server.
    pub endpoint: Option<String>,
    /// Retry budget and backoff.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_owned(),
            endpoint: None,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `region` with default retry settings.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Use `endpoint` instead of the regional endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use `retry` instead of the default retry settings.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = RetryConfig::default();
        let (base_delay, max_delay) = match defaults.backoff {
            Backoff::Exponential {
                base_delay,
                max_delay,
                ..
            } => (base_delay, max_delay),
            Backoff::Constant(delay) => (delay, delay),
        };
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .map_or(default, Duration::from_millis)
        };

        let retry = RetryConfig {
            time_limit: lookup("DYNAMODB_RETRY_TIME_LIMIT_SECS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.time_limit, Duration::from_secs),
            backoff: Backoff::Exponential {
                base_delay: millis("DYNAMODB_RETRY_BASE_DELAY_MS", base_delay),
                factor: 2.0,
                max_delay: millis("DYNAMODB_RETRY_MAX_DELAY_MS", max_delay),
            },
            jitter: if env_bool(&lookup, "DYNAMODB_RETRY_JITTER", true) {
                defaults.jitter
            } else {
                Jitter::None
            },
        };

        Self {
            region: lookup("AWS_REGION")
                .or_else(|| lookup("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            endpoint: lookup("DYNAMODB_ENDPOINT_URL").filter(|v| !v.is_empty()),
            retry,
        }
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://dynamodb.{}.amazonaws.com/", self.region),
        }
    }
}

fn env_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}
