//! Rendering expression trees to placeholder text.
//!
//! All expressions of one request share a single [`Placeholders`], so a
//! condition and an update on the same request never hand out the same token.
//! Every path element and every literal gets its own token, even when the same
//! path appears twice.

use std::collections::HashMap;

use ddbwire_model::AttributeValue;

use super::ast::{
    Condition, FunctionName, HashKey, Operand, Path, PathElement, PathValue, Projection,
    SetAction, SetValue, UpdateExpr,
};

/// Largest value list accepted by `IN`.
pub const MAX_IN_VALUES: usize = 100;

/// Errors produced while compiling an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// `IN` was given no values or too many.
    #[error("IN takes between 1 and 100 values, got {count}")]
    InListSize {
        /// Number of values supplied.
        count: usize,
    },
    /// A string or binary operand that must not be empty was empty.
    #[error("{function} requires a non-empty operand")]
    EmptyOperand {
        /// The function that rejected it.
        function: FunctionName,
    },
    /// An update with no SET, REMOVE, ADD or DELETE clause.
    #[error("update expression has no clauses")]
    EmptyUpdate,
}

/// Name and value placeholder maps for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl Placeholders {
    /// An empty set of placeholders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh `#nK` token for an attribute name.
    pub fn name(&mut self, name: &str) -> String {
        let token = format!("#n{}", self.names.len());
        self.names.insert(token.clone(), name.to_owned());
        token
    }

    /// Allocate a fresh `:vK` token for a literal.
    pub fn value(&mut self, value: AttributeValue) -> String {
        let token = format!(":v{}", self.values.len());
        self.values.insert(token.clone(), value);
        token
    }

    /// Name tokens handed out so far.
    #[must_use]
    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    /// Value tokens handed out so far.
    #[must_use]
    pub fn values(&self) -> &HashMap<String, AttributeValue> {
        &self.values
    }

    /// Split into the `ExpressionAttributeNames` and `ExpressionAttributeValues` maps.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, AttributeValue>) {
        (self.names, self.values)
    }
}

/// Render a condition or filter expression.
pub fn compile_condition(
    condition: &Condition,
    placeholders: &mut Placeholders,
) -> Result<String, ExpressionError> {
    let rendered = match condition {
        Condition::Compare { left, op, right } => {
            let left = render_operand(left, placeholders);
            let right = render_operand(right, placeholders);
            format!("{left} {op} {right}")
        }
        Condition::Between { value, low, high } => {
            let value = render_operand(value, placeholders);
            let low = render_operand(low, placeholders);
            let high = render_operand(high, placeholders);
            format!("{value} BETWEEN {low} AND {high}")
        }
        Condition::In { value, list } => {
            if list.is_empty() || list.len() > MAX_IN_VALUES {
                return Err(ExpressionError::InListSize { count: list.len() });
            }
            let value = render_operand(value, placeholders);
            let list: Vec<String> = list
                .iter()
                .map(|op| render_operand(op, placeholders))
                .collect();
            format!("{value} IN ({})", list.join(","))
        }
        Condition::Logical { op, left, right } => {
            let left = compile_condition(left, placeholders)?;
            let right = compile_condition(right, placeholders)?;
            format!("({left} {op} {right})")
        }
        Condition::Not(inner) => format!("(NOT {})", compile_condition(inner, placeholders)?),
        Condition::Function { name, args } => {
            check_function_args(*name, args)?;
            let args: Vec<String> = args
                .iter()
                .map(|op| render_operand(op, placeholders))
                .collect();
            format!("{name}({})", args.join(", "))
        }
    };
    Ok(rendered)
}

fn check_function_args(name: FunctionName, args: &[Operand]) -> Result<(), ExpressionError> {
    if !matches!(name, FunctionName::BeginsWith | FunctionName::Contains) {
        return Ok(());
    }
    let empty = args.iter().skip(1).any(|arg| {
        matches!(arg, Operand::Value(AttributeValue::S(s)) if s.is_empty())
            || matches!(arg, Operand::Value(AttributeValue::B(b)) if b.is_empty())
    });
    if empty {
        return Err(ExpressionError::EmptyOperand { function: name });
    }
    Ok(())
}

/// Render an update expression. Returns `None` when the update has no clauses.
#[must_use]
pub fn compile_update(update: &UpdateExpr, placeholders: &mut Placeholders) -> Option<String> {
    let mut clauses = Vec::with_capacity(4);

    if !update.set_actions.is_empty() {
        let actions: Vec<String> = update
            .set_actions
            .iter()
            .map(|action| render_set_action(action, placeholders))
            .collect();
        clauses.push(format!("SET {}", actions.join(", ")));
    }
    if !update.remove_paths.is_empty() {
        let paths: Vec<String> = update
            .remove_paths
            .iter()
            .map(|path| render_path(path, placeholders))
            .collect();
        clauses.push(format!("REMOVE {}", paths.join(", ")));
    }
    if !update.add_actions.is_empty() {
        clauses.push(format!(
            "ADD {}",
            render_path_values(&update.add_actions, placeholders)
        ));
    }
    if !update.delete_actions.is_empty() {
        clauses.push(format!(
            "DELETE {}",
            render_path_values(&update.delete_actions, placeholders)
        ));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" "))
    }
}

fn render_set_action(action: &SetAction, placeholders: &mut Placeholders) -> String {
    let path = render_path(&action.path, placeholders);
    let value = match &action.value {
        SetValue::Operand(op) => render_operand(op, placeholders),
        SetValue::Plus(left, right) => {
            let left = render_operand(left, placeholders);
            format!("{left} + {}", render_operand(right, placeholders))
        }
        SetValue::Minus(left, right) => {
            let left = render_operand(left, placeholders);
            format!("{left} - {}", render_operand(right, placeholders))
        }
        SetValue::IfNotExists(target, fallback) => {
            let target = render_path(target, placeholders);
            format!(
                "if_not_exists({target}, {})",
                render_operand(fallback, placeholders)
            )
        }
        SetValue::ListAppend(left, right) => {
            let left = render_operand(left, placeholders);
            format!(
                "list_append({left}, {})",
                render_operand(right, placeholders)
            )
        }
    };
    format!("{path} = {value}")
}

fn render_path_values(actions: &[PathValue], placeholders: &mut Placeholders) -> String {
    actions
        .iter()
        .map(|action| {
            let path = render_path(&action.path, placeholders);
            format!("{path} {}", render_operand(&action.value, placeholders))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a `Query` key condition.
pub fn compile_key_condition(
    key: &HashKey,
    placeholders: &mut Placeholders,
) -> Result<String, ExpressionError> {
    let (name, value, range) = key.parts();
    let name = placeholders.name(name);
    let value = render_operand(value, placeholders);
    let mut rendered = format!("{name} = {value}");
    if let Some(range) = range {
        rendered.push_str(" AND ");
        rendered.push_str(&compile_condition(&range.0, placeholders)?);
    }
    Ok(rendered)
}

/// Render a projection. Returns `None` for an empty projection.
#[must_use]
pub fn compile_projection(
    projection: &Projection,
    placeholders: &mut Placeholders,
) -> Option<String> {
    if projection.paths.is_empty() {
        return None;
    }
    let paths: Vec<String> = projection
        .paths
        .iter()
        .map(|path| render_path(path, placeholders))
        .collect();
    Some(paths.join(","))
}

fn render_operand(operand: &Operand, placeholders: &mut Placeholders) -> String {
    match operand {
        Operand::Path(path) => render_path(path, placeholders),
        Operand::Value(value) => placeholders.value(value.clone()),
        Operand::Size(path) => format!("size({})", render_path(path, placeholders)),
    }
}

fn render_path(path: &Path, placeholders: &mut Placeholders) -> String {
    let mut rendered = String::new();
    for elem in &path.elements {
        match elem {
            PathElement::Attribute(name) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(&placeholders.name(name));
            }
            PathElement::Index(idx) => {
                rendered.push('[');
                rendered.push_str(&idx.to_string());
                rendered.push(']');
            }
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use ddbwire_model::Value;

    use super::*;
    use crate::expression::ast::{AttributeType, RangeKey};

    fn n(s: &str) -> AttributeValue {
        AttributeValue::N(s.to_owned())
    }

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_owned())
    }

    #[test]
    fn test_should_render_comparison_with_placeholders() {
        let mut ph = Placeholders::new();
        let rendered = compile_condition(&Path::new("age").gte(18), &mut ph).unwrap();
        assert_eq!(rendered, "#n0 >= :v0");
        assert_eq!(ph.names()["#n0"], "age");
        assert_eq!(ph.values()[":v0"], n("18"));
    }

    #[test]
    fn test_should_give_repeated_paths_distinct_placeholders() {
        let mut ph = Placeholders::new();
        let cond = Path::new("x").gt(1).and(Path::new("x").lt(10));
        let rendered = compile_condition(&cond, &mut ph).unwrap();
        assert_eq!(rendered, "(#n0 > :v0 AND #n1 < :v1)");
        assert_eq!(ph.names()["#n0"], "x");
        assert_eq!(ph.names()["#n1"], "x");
    }

    #[test]
    fn test_should_parenthesise_every_combinator() {
        let mut ph = Placeholders::new();
        let cond = Path::new("a")
            .eq("x")
            .or(Path::new("b").exists())
            .and(Path::new("c").ne(true).not());
        let rendered = compile_condition(&cond, &mut ph).unwrap();
        assert_eq!(
            rendered,
            "((#n0 = :v0 OR attribute_exists(#n1)) AND (NOT #n2 <> :v1))"
        );
    }

    #[test]
    fn test_should_not_allocate_values_for_existence_checks() {
        let mut ph = Placeholders::new();
        let cond = Path::new("a").exists().and(Path::new("b").not_exists());
        let rendered = compile_condition(&cond, &mut ph).unwrap();
        assert_eq!(rendered, "(attribute_exists(#n0) AND attribute_not_exists(#n1))");
        assert!(ph.values().is_empty());
    }

    #[test]
    fn test_should_render_nested_paths() {
        let mut ph = Placeholders::new();
        let path = Path::new("a").attr("b").index(2).attr("c");
        let rendered = compile_condition(&path.eq(Path::new("d")), &mut ph).unwrap();
        assert_eq!(rendered, "#n0.#n1[2].#n2 = #n3");
        assert_eq!(ph.names().len(), 4);
    }

    #[test]
    fn test_should_render_between_in_and_size() {
        let mut ph = Placeholders::new();
        let cond = Path::new("p")
            .between(1, 5)
            .and(Path::new("q").is_in(["a", "b"]))
            .and(Path::new("r").size().lte(3));
        let rendered = compile_condition(&cond, &mut ph).unwrap();
        assert_eq!(
            rendered,
            "((#n0 BETWEEN :v0 AND :v1 AND #n1 IN (:v2,:v3)) AND size(#n2) <= :v4)"
        );
    }

    #[test]
    fn test_should_enforce_in_bounds() {
        let mut ph = Placeholders::new();
        let empty = Path::new("a").is_in(Vec::<i64>::new());
        assert_eq!(
            compile_condition(&empty, &mut ph),
            Err(ExpressionError::InListSize { count: 0 })
        );
        let too_many = Path::new("a").is_in(0..=100);
        assert_eq!(
            compile_condition(&too_many, &mut ph),
            Err(ExpressionError::InListSize { count: 101 })
        );
        let max = Path::new("a").is_in(0..100);
        assert!(compile_condition(&max, &mut Placeholders::new()).is_ok());
    }

    #[test]
    fn test_should_reject_empty_prefix_and_contains() {
        let mut ph = Placeholders::new();
        assert_eq!(
            compile_condition(&Path::new("a").begins_with(""), &mut ph),
            Err(ExpressionError::EmptyOperand {
                function: FunctionName::BeginsWith
            })
        );
        assert_eq!(
            compile_condition(&Path::new("a").contains(Vec::<u8>::new()), &mut ph),
            Err(ExpressionError::EmptyOperand {
                function: FunctionName::Contains
            })
        );
        let rendered = compile_condition(&Path::new("tags").contains(7), &mut ph).unwrap();
        assert_eq!(rendered, "contains(#n0, :v0)");
    }

    #[test]
    fn test_should_send_attribute_type_as_value() {
        let mut ph = Placeholders::new();
        let cond = Path::new("a").attribute_type(AttributeType::StringSet);
        let rendered = compile_condition(&cond, &mut ph).unwrap();
        assert_eq!(rendered, "attribute_type(#n0, :v0)");
        assert_eq!(ph.values()[":v0"], s("SS"));
    }

    #[test]
    fn test_should_join_update_clauses_in_order() {
        let mut ph = Placeholders::new();
        let update = Path::new("d")
            .delete(Value::<f64>::string_set(["x"]))
            .and(Path::new("a").set("v"))
            .and(Path::new("c").add(1))
            .and(Path::new("b").remove())
            .and(Path::new("e").set_if_not_exists(0));
        let rendered = compile_update(&update, &mut ph).unwrap();
        assert_eq!(
            rendered,
            "SET #n0 = :v0, #n1 = if_not_exists(#n2, :v1) REMOVE #n3 ADD #n4 :v2 DELETE #n5 :v3"
        );
        assert_eq!(ph.names()["#n5"], "d");
    }

    #[test]
    fn test_should_render_change_by_sign() {
        let mut ph = Placeholders::new();
        let update = Path::new("n").change(3).and(Path::new("m").change(-4));
        let rendered = compile_update(&update, &mut ph).unwrap();
        assert_eq!(rendered, "SET #n0 = #n1 + :v0, #n2 = #n3 - :v1");
        assert_eq!(ph.values()[":v1"], n("4"));
    }

    #[test]
    fn test_should_render_list_append() {
        let mut ph = Placeholders::new();
        let update = Path::new("l").append(vec![Value::<f64>::from("x")]);
        let rendered = compile_update(&update, &mut ph).unwrap();
        assert_eq!(rendered, "SET #n0 = list_append(#n1, :v0)");
        assert_eq!(ph.values()[":v0"], AttributeValue::L(vec![s("x")]));
    }

    #[test]
    fn test_should_return_none_for_empty_update() {
        let mut ph = Placeholders::new();
        assert!(compile_update(&UpdateExpr::default(), &mut ph).is_none());
        assert!(ph.names().is_empty());
    }

    #[test]
    fn test_should_pass_same_path_in_set_and_remove_through() {
        let mut ph = Placeholders::new();
        let update = Path::new("a").set(1).and(Path::new("a").remove());
        let rendered = compile_update(&update, &mut ph).unwrap();
        assert_eq!(rendered, "SET #n0 = :v0 REMOVE #n1");
    }

    #[test]
    fn test_should_render_key_condition() {
        let mut ph = Placeholders::new();
        let key = HashKey::new("pk", "user#1");
        assert_eq!(compile_key_condition(&key, &mut ph).unwrap(), "#n0 = :v0");

        let mut ph = Placeholders::new();
        let key = HashKey::new("pk", "user#1").and(RangeKey::new("sk").begins_with("order#"));
        assert_eq!(
            compile_key_condition(&key, &mut ph).unwrap(),
            "#n0 = :v0 AND begins_with(#n1, :v1)"
        );
        assert_eq!(ph.names()["#n1"], "sk");
    }

    #[test]
    fn test_should_render_projection() {
        let mut ph = Placeholders::new();
        let projection = Projection::new([Path::new("a"), Path::new("b").index(0)]);
        assert_eq!(
            compile_projection(&projection, &mut ph).as_deref(),
            Some("#n0,#n1[0]")
        );
        assert!(compile_projection(&Projection::default(), &mut ph).is_none());
    }

    #[test]
    fn test_should_share_placeholders_across_expressions() {
        let mut ph = Placeholders::new();
        let cond = compile_condition(&Path::new("a").exists(), &mut ph).unwrap();
        let update = compile_update(&Path::new("b").set(1), &mut ph).unwrap();
        assert_eq!(cond, "attribute_exists(#n0)");
        assert_eq!(update, "SET #n1 = :v0");
        let (names, values) = ph.into_parts();
        assert_eq!(names.len(), 2);
        assert_eq!(values.len(), 1);
    }
}
