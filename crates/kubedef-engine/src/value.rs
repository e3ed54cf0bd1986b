//! Evaluated values
//!
//! A `Value` is either concrete data, or a marker for why it is not:
//! `Incomplete` when a required field was never given a value, `Bottom` when
//! unification failed. Markers live inside the tree at the position where the
//! problem occurred, so a caller can report exactly which field is wrong.

use std::collections::BTreeMap;
use std::fmt;

/// Why unification produced no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BottomKind {
    /// A referenced definition is not exported by its package
    UndefinedField,
    /// Two values (or a value and a type) disagree
    Conflict,
    /// A closed object received a field it does not declare
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bottom {
    pub kind: BottomKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Incomplete(String),
    Bottom(Bottom),
}

impl Value {
    pub fn bottom(kind: BottomKind, message: impl Into<String>) -> Self {
        Value::Bottom(Bottom {
            kind,
            message: message.into(),
        })
    }

    pub fn empty_struct() -> Self {
        Value::Struct(BTreeMap::new())
    }

    /// Convert parsed YAML. Non-string keys are stringified; tags are dropped.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Self {
        match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::List(items.into_iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Struct(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from_yaml(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Struct(
                map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect(),
            ),
        }
    }

    /// Type name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
            Value::Incomplete(_) => "incomplete",
            Value::Bottom(_) => "_|_",
        }
    }

    /// The first non-concrete value in depth-first, key-sorted order
    pub fn first_error(&self) -> Option<&Value> {
        match self {
            Value::Incomplete(_) | Value::Bottom(_) => Some(self),
            Value::List(items) => items.iter().find_map(Value::first_error),
            Value::Struct(fields) => fields.values().find_map(Value::first_error),
            _ => None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        self.first_error().is_none()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Follow a dot-separated path through struct fields
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |current, key| current.get(key))
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Renders the value the way it appears in conflict messages
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(_) => write!(f, "[...]"),
            Value::Struct(_) => write!(f, "{{...}}"),
            Value::Incomplete(msg) => write!(f, "{}", msg),
            Value::Bottom(b) => write!(f, "_|_ // {}", b.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_numbers() {
        let value = Value::from_yaml(serde_yaml::from_str("{port: 80, ratio: 0.5}").unwrap());
        assert_eq!(value.get("port"), Some(&Value::Int(80)));
        assert_eq!(value.get("ratio"), Some(&Value::Float(0.5)));
    }

    #[test]
    fn test_from_yaml_stringifies_keys() {
        let value = Value::from_yaml(serde_yaml::from_str("{80: http, true: yes}").unwrap());
        assert_eq!(value.get("80"), Some(&Value::String("http".into())));
        assert!(value.get("true").is_some());
    }

    #[test]
    fn test_first_error_finds_nested_marker() {
        let value = Value::from_json(serde_json::json!({"spec": {"ports": [{"port": 80}]}}));
        assert!(value.is_concrete());

        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), Value::Int(1));
        fields.insert(
            "b".to_string(),
            Value::List(vec![Value::Incomplete("output.b.0: incomplete value int".into())]),
        );
        let value = Value::Struct(fields);
        assert_eq!(
            value.first_error(),
            Some(&Value::Incomplete("output.b.0: incomplete value int".into()))
        );
    }

    #[test]
    fn test_lookup() {
        let value = Value::from_json(serde_json::json!({"metadata": {"name": "myapp"}}));
        assert_eq!(value.lookup("metadata.name"), Some(&Value::String("myapp".into())));
        assert!(value.lookup("metadata.namespace").is_none());
    }
}
