//! Conversion between native [`Value`]s and wire [`AttributeValue`]s.
//!
//! Encoding is total. Decoding only fails when the caller's number parser
//! rejects a numeric text; unknown tags are rejected earlier, when the JSON body
//! is deserialized.

use crate::attribute_value::{AttributeMap, AttributeValue};
use crate::value::{Item, NumberText, Numeric, Value};

/// Value codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The number parser rejected a numeric text.
    #[error("invalid number {text:?}: {reason}")]
    InvalidNumber {
        /// The offending text.
        text: String,
        /// Why the parser rejected it.
        reason: String,
    },
    /// The JSON was not a well-formed tagged value.
    #[error("malformed wire value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses numeric wire text into the caller's number type.
pub type NumberParser<N> = fn(&str) -> Result<N, CodecError>;

/// Parses numeric text as `f64`.
pub fn parse_f64(text: &str) -> Result<f64, CodecError> {
    text.parse().map_err(|e: std::num::ParseFloatError| CodecError::InvalidNumber {
        text: text.to_owned(),
        reason: e.to_string(),
    })
}

/// Parses numeric text as `i64`.
pub fn parse_i64(text: &str) -> Result<i64, CodecError> {
    text.parse().map_err(|e: std::num::ParseIntError| CodecError::InvalidNumber {
        text: text.to_owned(),
        reason: e.to_string(),
    })
}

/// Keeps numeric text verbatim.
pub fn parse_number_text(text: &str) -> Result<NumberText, CodecError> {
    Ok(NumberText(text.to_owned()))
}

/// Encodes a native value into its wire form.
#[must_use]
pub fn encode<N: Numeric>(value: &Value<N>) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Number(n) => AttributeValue::N(n.to_number_text()),
        Value::Binary(b) => AttributeValue::B(b.clone()),
        Value::List(list) => AttributeValue::L(list.iter().map(encode).collect()),
        Value::Map(map) => AttributeValue::M(encode_item(map)),
        Value::StringSet(set) => AttributeValue::Ss(set.clone()),
        Value::NumberSet(set) => {
            AttributeValue::Ns(set.iter().map(Numeric::to_number_text).collect())
        }
        Value::BinarySet(set) => AttributeValue::Bs(set.clone()),
    }
}

/// Encodes every attribute of an item.
#[must_use]
pub fn encode_item<N: Numeric>(item: &Item<N>) -> AttributeMap {
    item.iter()
        .map(|(name, value)| (name.clone(), encode(value)))
        .collect()
}

/// Decodes a wire value, handing numeric text to `parse`.
pub fn decode<N, F>(value: AttributeValue, parse: &F) -> Result<Value<N>, CodecError>
where
    F: Fn(&str) -> Result<N, CodecError>,
{
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => Value::Number(parse(&n)?),
        AttributeValue::B(b) => Value::Binary(b),
        AttributeValue::L(list) => Value::List(
            list.into_iter()
                .map(|v| decode(v, parse))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Map(decode_item(map, parse)?),
        AttributeValue::Ss(set) => Value::StringSet(set),
        AttributeValue::Ns(set) => Value::NumberSet(
            set.iter()
                .map(|n| parse(n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(set) => Value::BinarySet(set),
    })
}

/// Decodes every attribute of a wire item.
pub fn decode_item<N, F>(item: AttributeMap, parse: &F) -> Result<Item<N>, CodecError>
where
    F: Fn(&str) -> Result<N, CodecError>,
{
    item.into_iter()
        .map(|(name, value)| Ok((name, decode(value, parse)?)))
        .collect()
}

/// Decodes an item straight from its JSON text.
pub fn decode_item_json<N, F>(json: &[u8], parse: &F) -> Result<Item<N>, CodecError>
where
    F: Fn(&str) -> Result<N, CodecError>,
{
    let wire: AttributeMap = serde_json::from_slice(json)?;
    decode_item(wire, parse)
}
