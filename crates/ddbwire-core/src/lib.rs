//! The ddbwire request pipeline: expressions, retries, pagination and the client.
//!
//! A [`Client`] compiles expressions into placeholder text, encodes items with
//! the value codec, signs each attempt with freshly resolved credentials, and
//! retries throttled or transient failures within a time budget. Reads over
//! many pages come back as lazy streams.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]

pub mod client;
pub mod config;
pub mod error;
pub mod expression;
pub mod options;
pub mod paginate;
pub mod retry;

pub use client::Client;
pub use config::ClientConfig;
pub use error::Error;
pub use expression::{
    AttributeType, Condition, ExpressionError, HashKey, Path, Placeholders, Projection, RangeKey,
    UpdateExpr,
};
pub use options::{GetOptions, Page, QueryOptions, ScanOptions, WriteOptions};
pub use retry::{Backoff, Jitter, RetryConfig};
