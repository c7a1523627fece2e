//! Native values.
//!
//! [`Value`] is what callers read and write. It is generic over the number type
//! so the caller decides how numeric text is interpreted: `f64` by default,
//! `i64` for integral tables, or [`NumberText`] to keep the exact decimal.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

/// A native attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<N = f64> {
    /// Null.
    Null,
    /// Boolean.
    Bool(bool),
    /// String.
    String(String),
    /// Number.
    Number(N),
    /// Binary.
    Binary(Bytes),
    /// Ordered list of values.
    List(Vec<Value<N>>),
    /// Map of named values.
    Map(HashMap<String, Value<N>>),
    /// Set of strings.
    StringSet(Vec<String>),
    /// Set of numbers.
    NumberSet(Vec<N>),
    /// Set of binaries.
    BinarySet(Vec<Bytes>),
}

/// One record: attribute name to native value.
pub type Item<N = f64> = HashMap<String, Value<N>>;

impl<N> Value<N> {
    /// Wraps a number.
    pub fn number(n: impl Into<N>) -> Self {
        Self::Number(n.into())
    }

    /// Builds a string set.
    pub fn string_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StringSet(values.into_iter().map(Into::into).collect())
    }

    /// Builds a number set.
    pub fn number_set<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<N>,
    {
        Self::NumberSet(values.into_iter().map(Into::into).collect())
    }

    /// Builds a binary set.
    pub fn binary_set<I, B>(values: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::BinarySet(values.into_iter().map(Into::into).collect())
    }

    /// Returns the string if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a [`Value::Number`].
    #[must_use]
    pub fn as_number(&self) -> Option<&N> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested map if this is a [`Value::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<&HashMap<String, Value<N>>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl<N> From<&str> for Value<N> {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl<N> From<String> for Value<N> {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<N> From<bool> for Value<N> {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<N> From<Bytes> for Value<N> {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

impl<N> From<Vec<u8>> for Value<N> {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(b))
    }
}

impl<N> From<Vec<Value<N>>> for Value<N> {
    fn from(list: Vec<Value<N>>) -> Self {
        Self::List(list)
    }
}

impl<N> From<HashMap<String, Value<N>>> for Value<N> {
    fn from(map: HashMap<String, Value<N>>) -> Self {
        Self::Map(map)
    }
}

/// A number type the codec can render to wire text.
pub trait Numeric: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Renders the number as decimal text. Floats use the shortest text that
    /// parses back to the same value.
    fn to_number_text(&self) -> String;
}

macro_rules! impl_numeric {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                fn to_number_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_numeric!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

/// Decimal text taken verbatim from the wire, for callers that need every digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NumberText(pub String);

impl NumberText {
    /// Returns the decimal text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NumberText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NumberText {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NumberText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Numeric for NumberText {
    fn to_number_text(&self) -> String {
        self.0.clone()
    }
}
