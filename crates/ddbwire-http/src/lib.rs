//! Transport boundary for ddbwire.
//!
//! The engine only builds `http::Request<Bytes>` values and reads
//! `http::Response<Bytes>` values. Anything that implements [`HttpClient`] can
//! carry them; [`ReqwestHttpClient`] is the default and [`MockHttpClient`]
//! replays scripted answers in tests.

pub mod client;
pub mod error;
pub mod mock;

pub use client::{HttpClient, ReqwestHttpClient};
pub use error::{TransportError, TransportErrorKind};
pub use mock::{MockHttpClient, RecordedRequest};
