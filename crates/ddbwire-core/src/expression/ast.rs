//! Expression trees and the builders that produce them.
//!
//! Nodes are immutable values: every builder and combinator returns a new node.
//! Rendering to placeholder text happens in [`compiler`](super::compiler).

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use ddbwire_model::{AttributeValue, NumberText, Numeric, Value, encode};

/// A document path: a top-level attribute followed by map keys and list indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    /// The path elements in order. Never empty.
    pub elements: Vec<PathElement>,
}

/// A single element in a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// A named attribute or map key.
    Attribute(String),
    /// A list index.
    Index(usize),
}

#[allow(clippy::should_implement_trait)]
impl Path {
    /// Path to a top-level attribute.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            elements: vec![PathElement::Attribute(root.into())],
        }
    }

    /// Descend into a map key.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.elements.push(PathElement::Attribute(name.into()));
        self
    }

    /// Descend into a list index.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.elements.push(PathElement::Index(index));
        self
    }

    /// `self = value`.
    pub fn eq(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    /// `self <> value`.
    pub fn ne(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Ne, value)
    }

    /// `self < value`.
    pub fn lt(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    /// `self <= value`.
    pub fn lte(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Le, value)
    }

    /// `self > value`.
    pub fn gt(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    /// `self >= value`.
    pub fn gte(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Ge, value)
    }

    fn compare(&self, op: CompareOp, value: impl Into<Operand>) -> Condition {
        Condition::Compare {
            left: Box::new(Operand::Path(self.clone())),
            op,
            right: Box::new(value.into()),
        }
    }

    /// `self BETWEEN low AND high`.
    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Condition {
        Condition::Between {
            value: Box::new(Operand::Path(self.clone())),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
    }

    /// `self IN (values...)`. Between 1 and 100 values are accepted when compiled.
    pub fn is_in<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Operand>,
    {
        Condition::In {
            value: Box::new(Operand::Path(self.clone())),
            list: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `begins_with(self, prefix)`. The prefix must not be empty.
    pub fn begins_with(&self, prefix: impl Into<Operand>) -> Condition {
        self.function(FunctionName::BeginsWith, Some(prefix.into()))
    }

    /// `contains(self, value)`. A string or binary value must not be empty.
    pub fn contains(&self, value: impl Into<Operand>) -> Condition {
        self.function(FunctionName::Contains, Some(value.into()))
    }

    /// `attribute_type(self, type)`.
    pub fn attribute_type(&self, attribute_type: AttributeType) -> Condition {
        let tag = AttributeValue::S(attribute_type.as_str().to_owned());
        self.function(FunctionName::AttributeType, Some(Operand::Value(tag)))
    }

    /// `attribute_exists(self)`.
    pub fn exists(&self) -> Condition {
        self.function(FunctionName::AttributeExists, None)
    }

    /// `attribute_not_exists(self)`.
    pub fn not_exists(&self) -> Condition {
        self.function(FunctionName::AttributeNotExists, None)
    }

    fn function(&self, name: FunctionName, arg: Option<Operand>) -> Condition {
        let mut args = vec![Operand::Path(self.clone())];
        args.extend(arg);
        Condition::Function { name, args }
    }

    /// `size(self)`, to be compared against a value.
    pub fn size(&self) -> Size {
        Size { path: self.clone() }
    }

    /// `SET self = value`.
    pub fn set(&self, value: impl Into<Operand>) -> UpdateExpr {
        self.set_action(SetValue::Operand(value.into()))
    }

    /// `SET self = if_not_exists(self, value)`.
    pub fn set_if_not_exists(&self, value: impl Into<Operand>) -> UpdateExpr {
        self.set_action(SetValue::IfNotExists(self.clone(), value.into()))
    }

    /// `SET self = self + diff`, or `self - |diff|` for a negative diff.
    pub fn change<N: Numeric>(&self, diff: N) -> UpdateExpr {
        let text = diff.to_number_text();
        let current = Operand::Path(self.clone());
        let value = match text.strip_prefix('-') {
            Some(magnitude) => SetValue::Minus(
                current,
                Operand::Value(AttributeValue::N(magnitude.to_owned())),
            ),
            None => SetValue::Plus(current, Operand::Value(AttributeValue::N(text))),
        };
        self.set_action(value)
    }

    /// `SET self = list_append(self, values)`.
    pub fn append(&self, values: impl Into<Operand>) -> UpdateExpr {
        self.set_action(SetValue::ListAppend(
            Operand::Path(self.clone()),
            values.into(),
        ))
    }

    fn set_action(&self, value: SetValue) -> UpdateExpr {
        UpdateExpr {
            set_actions: vec![SetAction {
                path: self.clone(),
                value,
            }],
            ..UpdateExpr::default()
        }
    }

    /// `REMOVE self`.
    pub fn remove(&self) -> UpdateExpr {
        UpdateExpr {
            remove_paths: vec![self.clone()],
            ..UpdateExpr::default()
        }
    }

    /// `ADD self value`, for numbers and sets.
    pub fn add(&self, value: impl Into<Operand>) -> UpdateExpr {
        UpdateExpr {
            add_actions: vec![PathValue {
                path: self.clone(),
                value: value.into(),
            }],
            ..UpdateExpr::default()
        }
    }

    /// `DELETE self value`, removing elements from a set.
    pub fn delete(&self, value: impl Into<Operand>) -> UpdateExpr {
        UpdateExpr {
            delete_actions: vec![PathValue {
                path: self.clone(),
                value: value.into(),
            }],
            ..UpdateExpr::default()
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, elem) in self.elements.iter().enumerate() {
            match elem {
                PathElement::Attribute(name) => {
                    if i > 0 {
                        write!(f, ".{name}")?;
                    } else {
                        write!(f, "{name}")?;
                    }
                }
                PathElement::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// `size(path)` as the left side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Size {
    path: Path,
}

#[allow(clippy::should_implement_trait)]
impl Size {
    /// `size(path) = value`.
    pub fn eq(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    /// `size(path) <> value`.
    pub fn ne(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Ne, value)
    }

    /// `size(path) < value`.
    pub fn lt(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    /// `size(path) <= value`.
    pub fn lte(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Le, value)
    }

    /// `size(path) > value`.
    pub fn gt(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    /// `size(path) >= value`.
    pub fn gte(&self, value: impl Into<Operand>) -> Condition {
        self.compare(CompareOp::Ge, value)
    }

    fn compare(&self, op: CompareOp, value: impl Into<Operand>) -> Condition {
        Condition::Compare {
            left: Box::new(Operand::Size(self.path.clone())),
            op,
            right: Box::new(value.into()),
        }
    }
}

/// Condition, filter and key-range expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `left op right`.
    Compare {
        /// Left-hand operand.
        left: Box<Operand>,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand operand.
        right: Box<Operand>,
    },
    /// `value BETWEEN low AND high`.
    Between {
        /// Value to test.
        value: Box<Operand>,
        /// Lower bound (inclusive).
        low: Box<Operand>,
        /// Upper bound (inclusive).
        high: Box<Operand>,
    },
    /// `value IN (list...)`.
    In {
        /// Value to search for.
        value: Box<Operand>,
        /// Candidate values.
        list: Vec<Operand>,
    },
    /// `(left AND right)` or `(left OR right)`.
    Logical {
        /// Logical operator.
        op: LogicalOp,
        /// Left-hand condition.
        left: Box<Condition>,
        /// Right-hand condition.
        right: Box<Condition>,
    },
    /// `(NOT inner)`.
    Not(Box<Condition>),
    /// `function_name(args...)`.
    Function {
        /// Function name.
        name: FunctionName,
        /// Function arguments; the first is always the path.
        args: Vec<Operand>,
    },
}

#[allow(clippy::should_implement_trait)]
impl Condition {
    /// Both must hold.
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        self.logical(LogicalOp::And, other)
    }

    /// Either must hold.
    #[must_use]
    pub fn or(self, other: Condition) -> Condition {
        self.logical(LogicalOp::Or, other)
    }

    /// Negation.
    #[must_use]
    pub fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    fn logical(self, op: LogicalOp, other: Condition) -> Condition {
        Condition::Logical {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Built-in condition functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionName {
    /// `attribute_exists(path)`.
    AttributeExists,
    /// `attribute_not_exists(path)`.
    AttributeNotExists,
    /// `attribute_type(path, type)`.
    AttributeType,
    /// `begins_with(path, prefix)`.
    BeginsWith,
    /// `contains(path, operand)`.
    Contains,
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeExists => write!(f, "attribute_exists"),
            Self::AttributeNotExists => write!(f, "attribute_not_exists"),
            Self::AttributeType => write!(f, "attribute_type"),
            Self::BeginsWith => write!(f, "begins_with"),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// Type names accepted by `attribute_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// String.
    String,
    /// Number.
    Number,
    /// Binary.
    Binary,
    /// Boolean.
    Bool,
    /// Null.
    Null,
    /// List.
    List,
    /// Map.
    Map,
    /// String set.
    StringSet,
    /// Number set.
    NumberSet,
    /// Binary set.
    BinarySet,
}

impl AttributeType {
    /// The wire tag naming this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::List => "L",
            Self::Map => "M",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
        }
    }
}

/// An operand: a path, a literal, or the size of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A document path.
    Path(Path),
    /// A literal, already in wire form.
    Value(AttributeValue),
    /// `size(path)`.
    Size(Path),
}

impl From<Path> for Operand {
    fn from(path: Path) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Operand {
    fn from(path: &Path) -> Self {
        Self::Path(path.clone())
    }
}

impl From<AttributeValue> for Operand {
    fn from(value: AttributeValue) -> Self {
        Self::Value(value)
    }
}

impl<N: Numeric> From<Value<N>> for Operand {
    fn from(value: Value<N>) -> Self {
        Self::Value(encode(&value))
    }
}

impl<N: Numeric> From<Vec<Value<N>>> for Operand {
    fn from(list: Vec<Value<N>>) -> Self {
        Self::Value(AttributeValue::L(list.iter().map(encode).collect()))
    }
}

impl<N: Numeric> From<HashMap<String, Value<N>>> for Operand {
    fn from(map: HashMap<String, Value<N>>) -> Self {
        Self::Value(encode(&Value::Map(map)))
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Self::Value(AttributeValue::S(s.to_owned()))
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Self::Value(AttributeValue::S(s))
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Self::Value(AttributeValue::Bool(b))
    }
}

impl From<Bytes> for Operand {
    fn from(b: Bytes) -> Self {
        Self::Value(AttributeValue::B(b))
    }
}

impl From<Vec<u8>> for Operand {
    fn from(b: Vec<u8>) -> Self {
        Self::Value(AttributeValue::B(Bytes::from(b)))
    }
}

impl From<NumberText> for Operand {
    fn from(n: NumberText) -> Self {
        Self::Value(AttributeValue::N(n.0))
    }
}

macro_rules! impl_numeric_operand {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Operand {
                fn from(n: $t) -> Self {
                    Self::Value(AttributeValue::N(n.to_number_text()))
                }
            }
        )*
    };
}

impl_numeric_operand!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

/// Update expression: the four clause kinds, each in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpr {
    /// SET actions.
    pub set_actions: Vec<SetAction>,
    /// REMOVE paths.
    pub remove_paths: Vec<Path>,
    /// ADD actions.
    pub add_actions: Vec<PathValue>,
    /// DELETE actions.
    pub delete_actions: Vec<PathValue>,
}

impl UpdateExpr {
    /// Combine two updates into one. The same path may end up in more than one
    /// clause; the service decides whether that is valid.
    #[must_use]
    pub fn and(mut self, other: UpdateExpr) -> UpdateExpr {
        self.set_actions.extend(other.set_actions);
        self.remove_paths.extend(other.remove_paths);
        self.add_actions.extend(other.add_actions);
        self.delete_actions.extend(other.delete_actions);
        self
    }

    /// No clause at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_actions.is_empty()
            && self.remove_paths.is_empty()
            && self.add_actions.is_empty()
            && self.delete_actions.is_empty()
    }
}

/// A single SET action: `path = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetAction {
    /// Target path.
    pub path: Path,
    /// Value to assign.
    pub value: SetValue,
}

/// The right-hand side of a SET action.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    /// Plain assignment.
    Operand(Operand),
    /// `left + right`.
    Plus(Operand, Operand),
    /// `left - right`.
    Minus(Operand, Operand),
    /// `if_not_exists(path, operand)`.
    IfNotExists(Path, Operand),
    /// `list_append(left, right)`.
    ListAppend(Operand, Operand),
}

/// An ADD or DELETE action: `path value`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathValue {
    /// Target path.
    pub path: Path,
    /// Number or set operand.
    pub value: Operand,
}

/// Key condition for `Query`: equality on the partition key, optionally
/// narrowed by a sort-key condition.
#[derive(Debug, Clone, PartialEq)]
pub struct HashKey {
    name: String,
    value: Operand,
    range: Option<RangeCondition>,
}

impl HashKey {
    /// `name = value` on the partition key.
    pub fn new(name: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            range: None,
        }
    }

    /// Also constrain the sort key.
    #[must_use]
    pub fn and(mut self, range: RangeCondition) -> Self {
        self.range = Some(range);
        self
    }

    pub(crate) fn parts(&self) -> (&str, &Operand, Option<&RangeCondition>) {
        (&self.name, &self.value, self.range.as_ref())
    }
}

/// Sort-key side of a key condition, built from [`RangeKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCondition(pub(crate) Condition);

/// Builder for the sort-key conditions a key condition allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeKey {
    path: Path,
}

#[allow(clippy::should_implement_trait)]
impl RangeKey {
    /// Conditions on the sort key `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            path: Path::new(name),
        }
    }

    /// `key = value`.
    pub fn eq(&self, value: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.eq(value))
    }

    /// `key < value`.
    pub fn lt(&self, value: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.lt(value))
    }

    /// `key <= value`.
    pub fn lte(&self, value: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.lte(value))
    }

    /// `key > value`.
    pub fn gt(&self, value: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.gt(value))
    }

    /// `key >= value`.
    pub fn gte(&self, value: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.gte(value))
    }

    /// `key BETWEEN low AND high`.
    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.between(low, high))
    }

    /// `begins_with(key, prefix)`.
    pub fn begins_with(&self, prefix: impl Into<Operand>) -> RangeCondition {
        RangeCondition(self.path.begins_with(prefix))
    }
}

/// The attributes to return from a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Paths in request order.
    pub paths: Vec<Path>,
}

impl Projection {
    /// Project the given paths.
    pub fn new(paths: impl IntoIterator<Item = Path>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Add another path.
    #[must_use]
    pub fn and(mut self, path: Path) -> Self {
        self.paths.push(path);
        self
    }
}
