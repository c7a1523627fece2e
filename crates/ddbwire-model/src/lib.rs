//! DynamoDB wire types and the value codec for ddbwire.
//!
//! The wire form ([`AttributeValue`]) and the native form ([`Value`]) are kept
//! apart; [`codec`] converts between them with a caller-chosen number type.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]

pub mod attribute_value;
pub mod codec;
pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;
pub mod value;

pub use attribute_value::{AttributeMap, AttributeValue};
pub use codec::{
    CodecError, NumberParser, decode, decode_item, decode_item_json, encode, encode_item,
    parse_f64, parse_i64, parse_number_text,
};
pub use error::{ErrorCode, ServiceError};
pub use operations::Operation;
pub use types::{ReturnValue, Select};
pub use value::{Item, NumberText, Numeric, Value};
