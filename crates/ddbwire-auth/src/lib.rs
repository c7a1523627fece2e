//! AWS Signature Version 4 signing and credential resolution for ddbwire.
//!
//! - [`canonical`]: canonical request construction
//! - [`sigv4`]: the signer
//! - [`credentials`]: keys, the source capability and the source chain
//! - [`cache`]: the client-owned cache with single-flight refresh

pub mod cache;
pub mod canonical;
pub mod credentials;
pub mod error;
pub mod sigv4;

pub use cache::CachedCredentials;
pub use credentials::{
    ChainCredentials, CredentialSource, Credentials, EnvironmentCredentials, StaticCredentials,
};
pub use error::AuthError;
pub use sigv4::sign;
