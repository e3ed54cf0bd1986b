//! Built-in kind catalogue
//!
//! The canonical schemas for well-known kinds are bundled with the crate rather
//! than discovered, so that their strict definitions do not drift with whatever
//! a particular cluster serves.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::crd::{CrdParser, SchemaProperty};
use crate::error::{Result, SchemaError};
use crate::gvk::Gvk;
use crate::translate::MAX_DEPTH;

const BUILTIN_CATALOGUE: &str = include_str!("catalogue.yaml");

static BUILTIN: OnceCell<Catalogue> = OnceCell::new();

/// One built-in kind and its canonical schema
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    pub gvk: Gvk,
    pub schema: SchemaProperty,
}

/// A fixed set of built-in schemas
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
}

#[derive(Deserialize)]
struct RawCatalogue {
    #[serde(default)]
    definitions: Map<String, Value>,
    kinds: Vec<RawKind>,
}

#[derive(Deserialize)]
struct RawKind {
    #[serde(default)]
    group: String,
    version: String,
    kind: String,
    schema: Value,
}

impl Catalogue {
    /// The catalogue bundled with this crate, parsed once per process
    pub fn builtin() -> Result<&'static Catalogue> {
        BUILTIN.get_or_try_init(|| Self::from_yaml(BUILTIN_CATALOGUE))
    }

    /// Parse a catalogue document (`definitions` + `kinds`)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawCatalogue = serde_yaml::from_str(yaml)?;

        let mut entries = Vec::with_capacity(raw.kinds.len());
        for kind in raw.kinds {
            let gvk = Gvk::new(kind.group, kind.version, kind.kind);
            let inlined = inline_refs(&kind.schema, &raw.definitions, &gvk, 0)?;
            entries.push(CatalogueEntry {
                schema: CrdParser::parse_schema_property(&inlined),
                gvk,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn get(&self, gvk: &Gvk) -> Option<&CatalogueEntry> {
        self.entries.iter().find(|e| &e.gvk == gvk)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace every `$ref: "#/definitions/<Name>"` with the referenced schema
fn inline_refs(
    value: &Value,
    definitions: &Map<String, Value>,
    gvk: &Gvk,
    depth: usize,
) -> std::result::Result<Value, SchemaError> {
    if depth > MAX_DEPTH {
        return Err(SchemaError::TooDeep {
            gvk: gvk.to_string(),
            path: "$ref".to_string(),
            limit: MAX_DEPTH,
        });
    }

    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                let target = reference
                    .strip_prefix("#/definitions/")
                    .and_then(|name| definitions.get(name))
                    .ok_or_else(|| SchemaError::UnresolvedRef {
                        reference: reference.to_string(),
                    })?;
                return inline_refs(target, definitions, gvk, depth + 1);
            }

            let mut out = Map::with_capacity(obj.len());
            for (key, child) in obj {
                out.insert(key.clone(), inline_refs(child, definitions, gvk, depth + 1)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| inline_refs(item, definitions, gvk, depth + 1))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::PropertyType;
    use crate::error::CoreError;

    #[test]
    fn test_builtin_catalogue_kinds() {
        let catalogue = Catalogue::builtin().unwrap();
        for gvk in [
            Gvk::new("", "v1", "Service"),
            Gvk::new("", "v1", "Secret"),
            Gvk::new("", "v1", "ConfigMap"),
            Gvk::new("", "v1", "Pod"),
            Gvk::new("apps", "v1", "Deployment"),
            Gvk::new("networking.k8s.io", "v1beta1", "Ingress"),
            Gvk::new("networking.k8s.io", "v1", "Ingress"),
        ] {
            assert!(catalogue.get(&gvk).is_some(), "missing {}", gvk);
        }
        assert!(catalogue.get(&Gvk::new("networking.k8s.io", "v1", "Deployment")).is_none());
    }

    #[test]
    fn test_refs_are_inlined() {
        let catalogue = Catalogue::builtin().unwrap();
        let deployment = catalogue.get(&Gvk::new("apps", "v1", "Deployment")).unwrap();

        let name = deployment
            .schema
            .get_nested("spec.template.spec.containers")
            .and_then(|c| c.items.as_deref())
            .and_then(|c| c.get_nested("name"))
            .unwrap();
        assert_eq!(name.type_, Some(PropertyType::String));
    }

    #[test]
    fn test_unresolved_ref() {
        let yaml = r##"
kinds:
  - version: v1
    kind: Broken
    schema:
      type: object
      properties:
        spec: { $ref: "#/definitions/Missing" }
"##;
        let err = Catalogue::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Schema(SchemaError::UnresolvedRef { .. })
        ));
    }

    #[test]
    fn test_recursive_ref_is_rejected() {
        let yaml = r##"
definitions:
  Node:
    type: object
    properties:
      child: { $ref: "#/definitions/Node" }
kinds:
  - version: v1
    kind: Tree
    schema: { $ref: "#/definitions/Node" }
"##;
        let err = Catalogue::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CoreError::Schema(SchemaError::TooDeep { .. })));
    }
}
