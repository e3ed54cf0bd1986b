//! Conversion between evaluated values and structured maps
//!
//! `Unstructured` is the weakly typed, JSON-object-shaped form the rest of the
//! Kubernetes tooling consumes. Numbers that are integral come out as `i64`;
//! everything else numeric as `f64`.

use kube::core::DynamicObject;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

use crate::engine::EvaluatedResult;
use crate::error::ConvertError;
use crate::unify::ROOT_LABEL;
use crate::value::{BottomKind, Value};

/// A Kubernetes object as a plain JSON map
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unstructured {
    object: Map<String, JsonValue>,
}

impl Unstructured {
    pub fn new(object: Map<String, JsonValue>) -> Self {
        Self { object }
    }

    pub fn object(&self) -> &Map<String, JsonValue> {
        &self.object
    }

    pub fn into_object(self) -> Map<String, JsonValue> {
        self.object
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.object.get(key)
    }

    pub fn api_version(&self) -> Option<&str> {
        self.object.get("apiVersion").and_then(JsonValue::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.object.get("kind").and_then(JsonValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.object.get("metadata")?.get(key)?.as_str()
    }

    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(&self.object)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.object)
    }
}

impl From<Unstructured> for JsonValue {
    fn from(value: Unstructured) -> Self {
        JsonValue::Object(value.object)
    }
}

impl TryFrom<Unstructured> for DynamicObject {
    type Error = serde_json::Error;

    fn try_from(value: Unstructured) -> Result<Self, Self::Error> {
        let mut object = value.object;
        object
            .entry("metadata")
            .or_insert_with(|| JsonValue::Object(Map::new()));
        serde_json::from_value(JsonValue::Object(object))
    }
}

/// Convert an evaluation result into a structured map
pub fn to_structured_map(result: &EvaluatedResult) -> Result<Unstructured, ConvertError> {
    match to_json(result.value())? {
        JsonValue::Object(object) => Ok(Unstructured::new(object)),
        other => Err(ConvertError::NotAnObject(json_kind(&other).to_string())),
    }
}

/// Convert any concrete value into JSON
pub fn to_json(value: &Value) -> Result<JsonValue, ConvertError> {
    if let Some(error) = value.first_error() {
        return Err(match error {
            Value::Incomplete(message) => ConvertError::IncompleteValue(message.clone()),
            Value::Bottom(bottom) if bottom.kind == BottomKind::UndefinedField => {
                ConvertError::Undefined(bottom.message.clone())
            }
            Value::Bottom(bottom) => ConvertError::Conflict(bottom.message.clone()),
            other => ConvertError::Conflict(other.to_string()),
        });
    }
    concrete_to_json(value, ROOT_LABEL)
}

fn concrete_to_json(value: &Value, path: &str) -> Result<JsonValue, ConvertError> {
    Ok(match value {
        Value::Null | Value::Incomplete(_) | Value::Bottom(_) => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => float_to_json(*f, path)?,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| concrete_to_json(item, &format!("{}.{}", path, i)))
                .collect::<Result<Vec<_>, ConvertError>>()?,
        ),
        Value::Struct(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), concrete_to_json(v, &format!("{}.{}", path, k))?)))
                .collect::<Result<_, ConvertError>>()?,
        ),
    })
}

fn float_to_json(f: f64, path: &str) -> Result<JsonValue, ConvertError> {
    // i64::MAX is not representable as f64; the bound is exclusive
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Ok(JsonValue::from(f as i64));
    }
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| ConvertError::NonFinite(format!("{}: {} has no JSON representation", path, f)))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

/// Convert a structured map back into an evaluated value
pub fn from_structured_map(object: &Unstructured) -> Value {
    Value::from_json(JsonValue::Object(object.object.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(value: JsonValue) -> EvaluatedResult {
        EvaluatedResult::new(Value::from_json(value))
    }

    #[test]
    fn test_numbers_keep_integer_identity() {
        let converted = to_structured_map(&result(json!({"port": 80, "ratio": 0.25}))).unwrap();
        assert_eq!(converted.get("port").and_then(JsonValue::as_i64), Some(80));
        assert!(converted.get("port").unwrap().is_i64());
        assert_eq!(converted.get("ratio").and_then(JsonValue::as_f64), Some(0.25));
    }

    #[test]
    fn test_integral_float_becomes_int() {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("replicas".to_string(), Value::Float(3.0));
        fields.insert("huge".to_string(), Value::Float(1e300));
        let converted = to_structured_map(&EvaluatedResult::new(Value::Struct(fields))).unwrap();
        assert!(converted.get("replicas").unwrap().is_i64());
        assert!(converted.get("huge").unwrap().is_f64());
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("ratio".to_string(), Value::Float(f64::NAN));
        let err = to_structured_map(&EvaluatedResult::new(Value::Struct(fields))).unwrap_err();
        assert_eq!(
            err,
            ConvertError::NonFinite("output.ratio: NaN has no JSON representation".to_string())
        );

        let list = Value::List(vec![Value::Int(1), Value::Float(f64::INFINITY)]);
        let err = to_json(&list).unwrap_err();
        assert_eq!(err.to_string(), "output.1: inf has no JSON representation");
    }

    #[test]
    fn test_yaml_nan_is_rejected() {
        let value = Value::from_yaml(serde_yaml::from_str("limit: .nan").unwrap());
        let err = to_structured_map(&EvaluatedResult::new(value)).unwrap_err();
        assert!(matches!(err, ConvertError::NonFinite(_)));
    }

    #[test]
    fn test_port_round_trip() {
        let original = Unstructured::new(
            json!({"spec": {"ports": [{"port": 80}]}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let value = from_structured_map(&original);
        let back = to_structured_map(&EvaluatedResult::new(value)).unwrap();
        assert_eq!(back, original);
        assert_eq!(back.get("spec").unwrap()["ports"][0]["port"], json!(80));
    }

    #[test]
    fn test_incomplete_is_reported_verbatim() {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert(
            "port".to_string(),
            Value::Incomplete("output.port: incomplete value int".to_string()),
        );
        let err = to_structured_map(&EvaluatedResult::new(Value::Struct(fields))).unwrap_err();
        assert_eq!(
            err,
            ConvertError::IncompleteValue("output.port: incomplete value int".to_string())
        );
    }

    #[test]
    fn test_undefined_is_reported_verbatim() {
        let value = Value::bottom(BottomKind::UndefinedField, "undefined field \"#Deployment\"");
        let err = to_structured_map(&EvaluatedResult::new(value)).unwrap_err();
        assert_eq!(err.to_string(), "undefined field \"#Deployment\"");
        assert!(matches!(err, ConvertError::Undefined(_)));
    }

    #[test]
    fn test_non_object_result() {
        let err = to_structured_map(&result(json!([1, 2]))).unwrap_err();
        assert_eq!(err, ConvertError::NotAnObject("list".to_string()));
    }

    #[test]
    fn test_into_dynamic_object() {
        let object = to_structured_map(&result(json!({
            "apiVersion": "example.com/v1",
            "kind": "Foo",
            "spec": {"key": "test1"}
        })))
        .unwrap();
        assert_eq!(object.kind(), Some("Foo"));
        assert_eq!(object.name(), None);

        let dynamic = DynamicObject::try_from(object).unwrap();
        let types = dynamic.types.unwrap();
        assert_eq!(types.api_version, "example.com/v1");
        assert_eq!(types.kind, "Foo");
        assert_eq!(dynamic.data["spec"]["key"], json!("test1"));
    }
}
