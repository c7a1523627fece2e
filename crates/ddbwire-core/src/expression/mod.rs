//! Typed expression builders and the placeholder compiler.
//!
//! Conditions, filters, key conditions, updates and projections are built as
//! immutable trees ([`ast`]) and rendered to `#name`/`:value` placeholder text
//! by [`compiler`]. Literals are encoded to wire values as they enter the tree.

pub mod ast;
pub mod compiler;

pub use ast::{
    AttributeType, CompareOp, Condition, FunctionName, HashKey, LogicalOp, Operand, Path,
    PathElement, Projection, RangeCondition, RangeKey, SetValue, Size, UpdateExpr,
};
pub use compiler::{
    ExpressionError, MAX_IN_VALUES, Placeholders, compile_condition, compile_key_condition,
    compile_projection, compile_update,
};
