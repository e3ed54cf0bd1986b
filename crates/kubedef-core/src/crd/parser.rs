//! CRD parser
//!
//! Parses CustomResourceDefinition objects (YAML manifests or JSON values
//! returned by the API server) into `CrdSchema`.

use serde::Deserialize;
use serde_json::Value;

use super::schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdVersion, PropertyType,
    SchemaProperty,
};
use crate::error::{CoreError, Result};

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidCrd {
        message: message.into(),
    }
}

/// Parser for CRD manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Parse every CRD in a multi-document YAML stream, skipping other kinds
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            if value.get("kind").and_then(Value::as_str) == Some("CustomResourceDefinition") {
                crds.push(Self::parse_value(&value)?);
            }
        }
        Ok(crds)
    }

    /// Parse from a serde_json::Value (useful for objects listed from the cluster)
    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(invalid(format!(
                "expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing 'metadata.name' field"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| invalid(format!("{}: missing 'spec' field", name)))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| invalid(format!("{}: missing 'spec.group' field", name)))?
            .to_string();

        let names = Self::parse_names(&name, spec.get("names"))?;
        let versions = Self::parse_versions(&name, spec)?;

        Ok(CrdSchema {
            name,
            group,
            names,
            versions,
        })
    }

    fn parse_names(crd: &str, names_value: Option<&Value>) -> Result<CrdNames> {
        let names =
            names_value.ok_or_else(|| invalid(format!("{}: missing 'spec.names' field", crd)))?;

        let kind = names
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| invalid(format!("{}: missing 'spec.names.kind' field", crd)))?
            .to_string();

        Ok(CrdNames {
            kind,
            plural: names
                .get("plural")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    fn parse_versions(crd: &str, spec: &Value) -> Result<Vec<CrdVersion>> {
        let versions = spec
            .get("versions")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid(format!("{}: missing 'spec.versions' array", crd)))?;

        // apiextensions/v1beta1 kept a single schema under spec.validation
        let legacy_schema = spec
            .get("validation")
            .and_then(|v| v.get("openAPIV3Schema"));

        versions
            .iter()
            .map(|v| Self::parse_version(crd, v, legacy_schema))
            .collect()
    }

    fn parse_version(crd: &str, version: &Value, legacy_schema: Option<&Value>) -> Result<CrdVersion> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{}: version missing 'name' field", crd)))?
            .to_string();

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .or(legacy_schema)
            .map(Self::parse_schema_property);

        Ok(CrdVersion {
            name,
            served: version
                .get("served")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            storage: version
                .get("storage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            schema,
        })
    }

    /// Parse a single schema node (recursive)
    pub fn parse_schema_property(prop: &Value) -> SchemaProperty {
        let properties = prop
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::parse_schema_property(v)))
                    .collect()
            });

        let items = prop
            .get("items")
            .map(|v| Box::new(Self::parse_schema_property(v)));

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            other => AdditionalProperties::Schema(Box::new(Self::parse_schema_property(other))),
        });

        SchemaProperty {
            type_: prop
                .get("type")
                .and_then(Value::as_str)
                .map(PropertyType::parse),
            properties,
            required: string_list(prop.get("required")),
            items,
            additional_properties,
            x_preserve_unknown: flag(prop, "x-kubernetes-preserve-unknown-fields"),
            x_embedded_resource: flag(prop, "x-kubernetes-embedded-resource"),
            x_int_or_string: flag(prop, "x-kubernetes-int-or-string"),
        }
    }
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOO_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: foo.example.com
spec:
  group: example.com
  scope: Namespaced
  names:
    kind: Foo
    listKind: FooList
    plural: foo
    singular: foo
  versions:
    - name: v1
      served: true
      storage: true
      subresources:
        status: {}
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              x-kubernetes-preserve-unknown-fields: true
              properties:
                key:
                  type: string
            status:
              type: object
              x-kubernetes-preserve-unknown-fields: true
              properties:
                key:
                  type: string
                app-hash:
                  type: string
"#;

    #[test]
    fn test_parse_foo_crd() {
        let crd = CrdParser::parse(FOO_CRD).unwrap();
        assert_eq!(crd.name, "foo.example.com");
        assert_eq!(crd.group, "example.com");
        assert_eq!(crd.names.kind, "Foo");
        assert_eq!(crd.names.plural, "foo");
        assert_eq!(crd.versions.len(), 1);

        let v1 = &crd.versions[0];
        assert!(v1.served && v1.storage);
        let schema = v1.schema.as_ref().unwrap();
        let spec = schema.get_nested("spec").unwrap();
        assert!(spec.x_preserve_unknown);
        assert_eq!(
            spec.get_nested("key").unwrap().type_,
            Some(PropertyType::String)
        );
        assert!(schema.get_nested("status.app-hash").is_some());
    }

    #[test]
    fn test_parse_untyped_property_keeps_none() {
        let value = serde_json::json!({
            "type": "object",
            "properties": { "anything": {} }
        });
        let prop = CrdParser::parse_schema_property(&value);
        assert_eq!(prop.get_nested("anything").unwrap().type_, None);
    }

    #[test]
    fn test_parse_additional_properties() {
        let value = serde_json::json!({
            "type": "object",
            "additionalProperties": { "type": "string" }
        });
        let prop = CrdParser::parse_schema_property(&value);
        match prop.additional_properties {
            Some(AdditionalProperties::Schema(inner)) => {
                assert_eq!(inner.type_, Some(PropertyType::String))
            }
            other => panic!("unexpected additionalProperties: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_other_kinds() {
        let err = CrdParser::parse("kind: ConfigMap\nmetadata:\n  name: x\n").unwrap_err();
        assert!(err.to_string().contains("expected CustomResourceDefinition"));
    }

    #[test]
    fn test_parse_requires_group() {
        let yaml = r#"
kind: CustomResourceDefinition
metadata:
  name: bars.example.com
spec:
  names:
    kind: Bar
  versions: []
"#;
        let err = CrdParser::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("spec.group"));
    }

    #[test]
    fn test_parse_all_skips_non_crds() {
        let stream = format!(
            "{}\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: other\n---\n",
            FOO_CRD
        );
        let crds = CrdParser::parse_all(&stream).unwrap();
        assert_eq!(crds.len(), 1);
        assert_eq!(crds[0].names.kind, "Foo");
    }

    #[test]
    fn test_legacy_validation_schema() {
        let yaml = r#"
kind: CustomResourceDefinition
metadata:
  name: olds.example.com
spec:
  group: example.com
  names:
    kind: Old
  validation:
    openAPIV3Schema:
      type: object
  versions:
    - name: v1beta1
"#;
        let crd = CrdParser::parse(yaml).unwrap();
        assert!(crd.versions[0].schema.is_some());
        assert!(crd.versions[0].served);
    }
}
