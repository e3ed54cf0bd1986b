//! Unification of evaluated values against schema nodes
//!
//! Unification never fails as a Rust error. A disagreement is recorded as a
//! `Value::Bottom` at the offending position and a missing required scalar as
//! `Value::Incomplete`; everything else in the tree is still unified, so a
//! second definition in the same conjunction sees the same shape.

use std::collections::BTreeMap;

use kubedef_core::{Field, ScalarKind, SchemaNode};

use crate::value::{BottomKind, Value};

/// Label of the evaluated root in diagnostics
pub const ROOT_LABEL: &str = "output";

/// Unify `value` with `node`, reporting positions relative to `path`
pub fn unify(node: &SchemaNode, value: Value, path: &str) -> Value {
    if matches!(value, Value::Bottom(_) | Value::Incomplete(_)) {
        return value;
    }

    match (node, value) {
        (SchemaNode::Any, value) => value,

        (SchemaNode::Literal(expected), Value::String(actual)) => {
            if &actual == expected {
                Value::String(actual)
            } else {
                Value::bottom(
                    BottomKind::Conflict,
                    format!(
                        "{}: conflicting values {:?} and {:?}",
                        path, actual, expected
                    ),
                )
            }
        }

        (SchemaNode::Scalar(ScalarKind::String), v @ Value::String(_))
        | (SchemaNode::Scalar(ScalarKind::Integer), v @ Value::Int(_))
        | (SchemaNode::Scalar(ScalarKind::Number), v @ (Value::Int(_) | Value::Float(_)))
        | (SchemaNode::Scalar(ScalarKind::Boolean), v @ Value::Bool(_))
        | (SchemaNode::IntOrString, v @ (Value::Int(_) | Value::String(_))) => v,

        (SchemaNode::Object { fields, open }, Value::Struct(given)) => {
            unify_object(fields, *open, given, path)
        }

        (SchemaNode::Map(element), Value::Struct(given)) => Value::Struct(
            given
                .into_iter()
                .map(|(key, v)| {
                    let child = unify(element, v, &join(path, &key));
                    (key, child)
                })
                .collect(),
        ),

        (SchemaNode::Array(element), Value::List(items)) => Value::List(
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| unify(element, item, &join(path, &idx.to_string())))
                .collect(),
        ),

        (node, value) => mismatch(node, &value, path),
    }
}

fn unify_object(
    fields: &BTreeMap<String, Field>,
    open: bool,
    given: BTreeMap<String, Value>,
    path: &str,
) -> Value {
    let mut out = BTreeMap::new();

    for (key, value) in given {
        let child_path = join(path, &key);
        let child = match fields.get(&key) {
            Some(field) => unify(&field.node, value, &child_path),
            None if open => value,
            None => Value::bottom(
                BottomKind::NotAllowed,
                format!("{}: field not allowed", child_path),
            ),
        };
        out.insert(key, child);
    }

    for (key, field) in fields {
        if field.required && !out.contains_key(key) {
            out.insert(key.clone(), default_for(&field.node, &join(path, key)));
        }
    }

    Value::Struct(out)
}

/// The value a required field takes when nothing provides one.
///
/// Structural nodes default to their empty shape (recursively filled), literals
/// to themselves, and everything else is incomplete.
pub fn default_for(node: &SchemaNode, path: &str) -> Value {
    match node {
        SchemaNode::Object { fields, .. } => Value::Struct(
            fields
                .iter()
                .filter(|(_, field)| field.required)
                .map(|(key, field)| (key.clone(), default_for(&field.node, &join(path, key))))
                .collect(),
        ),
        SchemaNode::Map(_) => Value::empty_struct(),
        SchemaNode::Array(_) => Value::List(Vec::new()),
        SchemaNode::Literal(value) => Value::String(value.clone()),
        other => Value::Incomplete(format!("{}: incomplete value {}", path, other.type_name())),
    }
}

fn mismatch(node: &SchemaNode, value: &Value, path: &str) -> Value {
    let expected = match node {
        SchemaNode::Object { .. } | SchemaNode::Map(_) => "struct".to_string(),
        SchemaNode::Literal(_) => "string".to_string(),
        other => other.type_name(),
    };
    Value::bottom(
        BottomKind::Conflict,
        format!(
            "{}: conflicting values {} and {} (mismatched types {} and {})",
            path,
            value,
            node.type_name(),
            value.kind_name(),
            expected
        ),
    )
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
