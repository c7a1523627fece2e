//! Error types for signing and credential resolution.

/// Errors raised while signing a request or resolving credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request has neither a `Host` header nor a URI authority.
    #[error("Request has no host to sign")]
    MissingHost,

    /// A header value is not visible ASCII and cannot be canonicalized.
    #[error("Header {0} has a value that cannot be signed")]
    InvalidHeaderValue(String),

    /// A credential source failed to produce a key.
    #[error("Credential source {source_name} failed: {message}")]
    Source {
        /// Name of the failing source.
        source_name: String,
        /// What went wrong.
        message: String,
    },
}
