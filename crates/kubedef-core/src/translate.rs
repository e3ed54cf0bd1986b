//! Schema translation
//!
//! Turns a structural OpenAPI schema (a CRD version or a catalogue entry) into a
//! `TypeDefinition`:
//!
//! ```text
//! openAPIV3Schema ──► SchemaProperty ──► SchemaNode ──► TypeDefinition
//!                      (parser)          (translate)    (+ kind, apiVersion,
//!                                                          metadata)
//! ```
//!
//! Every "is this shape valid" decision is made here. Once a definition exists,
//! its tree is finite and uses only `SchemaNode` variants.

use std::collections::BTreeMap;

use crate::catalogue::CatalogueEntry;
use crate::crd::{AdditionalProperties, CrdSchema, CrdVersion, PropertyType, SchemaProperty};
use crate::error::SchemaError;
use crate::gvk::Gvk;
use crate::schema::{object_meta, Field, Origin, ScalarKind, SchemaNode, TypeDefinition};

/// Deepest nesting accepted before a schema is considered malformed
pub const MAX_DEPTH: usize = 64;

const ROOT: &str = "<root>";

/// Stateless schema translator
pub struct Translator;

impl Translator {
    /// Translate one served version of a CRD
    pub fn translate_crd(crd: &CrdSchema, version: &CrdVersion) -> Result<TypeDefinition, SchemaError> {
        Self::translate(crd.gvk(version), Origin::Crd, version.schema.as_ref())
    }

    /// Translate a catalogue entry
    pub fn translate_builtin(entry: &CatalogueEntry) -> Result<TypeDefinition, SchemaError> {
        Self::translate(entry.gvk.clone(), Origin::Builtin, Some(&entry.schema))
    }

    /// Translate a root schema for `gvk`
    pub fn translate(
        gvk: Gvk,
        origin: Origin,
        schema: Option<&SchemaProperty>,
    ) -> Result<TypeDefinition, SchemaError> {
        let schema = schema.ok_or_else(|| SchemaError::MissingSchema {
            gvk: gvk.to_string(),
        })?;

        let walker = Walker { gvk: &gvk };
        let (mut fields, open) = match walker.node(schema, ROOT, 0)? {
            SchemaNode::Object { fields, open } => (fields, open),
            // A root with only additionalProperties still has to carry kind/apiVersion
            SchemaNode::Map(_) | SchemaNode::Any => (BTreeMap::new(), true),
            other => {
                return Err(SchemaError::UnsupportedType {
                    gvk: gvk.to_string(),
                    path: ROOT.to_string(),
                    type_name: other.type_name(),
                });
            }
        };

        fields.insert(
            "kind".to_string(),
            Field::required(SchemaNode::Literal(gvk.kind.clone())),
        );
        fields.insert(
            "apiVersion".to_string(),
            Field::required(SchemaNode::Literal(gvk.api_version())),
        );
        // Catalogue entries inline their own full ObjectMeta
        if origin == Origin::Crd || !describes_metadata(&fields) {
            inject_metadata(&mut fields);
        }

        Ok(TypeDefinition {
            gvk,
            origin,
            root: SchemaNode::Object { fields, open },
        })
    }
}

fn describes_metadata(fields: &BTreeMap<String, Field>) -> bool {
    fields.get("metadata").is_some_and(|f| match &f.node {
        SchemaNode::Object { fields, open } => !fields.is_empty() && !open,
        _ => false,
    })
}

/// Standard object metadata, narrowed by any `name`/`generateName` the schema declares.
/// Other declared metadata properties are dropped, as the API server does.
fn inject_metadata(fields: &mut BTreeMap<String, Field>) {
    let declared = fields.remove("metadata");
    let required = declared.as_ref().is_some_and(|f| f.required);

    let mut node = object_meta();
    if let (
        Some(Field {
            node: SchemaNode::Object { fields: declared, .. },
            ..
        }),
        SchemaNode::Object { fields: meta, .. },
    ) = (declared, &mut node)
    {
        for (name, field) in declared {
            if name == "name" || name == "generateName" {
                meta.insert(name, field);
            }
        }
    }

    fields.insert("metadata".to_string(), Field { node, required });
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == ROOT {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

struct Walker<'a> {
    gvk: &'a Gvk,
}

impl Walker<'_> {
    fn node(&self, prop: &SchemaProperty, path: &str, depth: usize) -> Result<SchemaNode, SchemaError> {
        if depth > MAX_DEPTH {
            return Err(SchemaError::TooDeep {
                gvk: self.gvk.to_string(),
                path: path.to_string(),
                limit: MAX_DEPTH,
            });
        }

        if prop.x_int_or_string {
            return Ok(SchemaNode::IntOrString);
        }

        match &prop.type_ {
            Some(PropertyType::String) => Ok(SchemaNode::Scalar(ScalarKind::String)),
            Some(PropertyType::Integer) => Ok(SchemaNode::Scalar(ScalarKind::Integer)),
            Some(PropertyType::Number) => Ok(SchemaNode::Scalar(ScalarKind::Number)),
            Some(PropertyType::Boolean) => Ok(SchemaNode::Scalar(ScalarKind::Boolean)),
            Some(PropertyType::Array) => self.array(prop, path, depth),
            Some(PropertyType::Object) => self.object(prop, path, depth),
            Some(PropertyType::Unknown(type_name)) => Err(SchemaError::UnsupportedType {
                gvk: self.gvk.to_string(),
                path: path.to_string(),
                type_name: type_name.clone(),
            }),
            None if prop.properties.is_some()
                || prop.additional_properties.is_some()
                || prop.x_preserve_unknown
                || prop.x_embedded_resource =>
            {
                self.object(prop, path, depth)
            }
            None if prop.items.is_some() => self.array(prop, path, depth),
            None => Ok(SchemaNode::Any),
        }
    }

    fn array(&self, prop: &SchemaProperty, path: &str, depth: usize) -> Result<SchemaNode, SchemaError> {
        let element = match &prop.items {
            Some(items) => self.node(items, &format!("{}[]", path), depth + 1)?,
            None => SchemaNode::Any,
        };
        Ok(SchemaNode::Array(Box::new(element)))
    }

    fn object(&self, prop: &SchemaProperty, path: &str, depth: usize) -> Result<SchemaNode, SchemaError> {
        if let Some(properties) = &prop.properties {
            let mut fields = BTreeMap::new();
            for (name, child) in properties {
                let node = self.node(child, &child_path(path, name), depth + 1)?;
                fields.insert(
                    name.clone(),
                    Field {
                        node,
                        required: prop.is_required(name),
                    },
                );
            }

            if prop.x_embedded_resource {
                for key in ["apiVersion", "kind"] {
                    fields
                        .entry(key.to_string())
                        .or_insert_with(|| Field::optional(SchemaNode::string()));
                }
                inject_metadata(&mut fields);
            }

            return Ok(SchemaNode::Object {
                fields,
                open: prop.x_preserve_unknown,
            });
        }

        match &prop.additional_properties {
            Some(AdditionalProperties::Schema(values)) => {
                let element = self.node(values, &format!("{}{{}}", path), depth + 1)?;
                Ok(SchemaNode::Map(Box::new(element)))
            }
            Some(AdditionalProperties::Allowed) => Ok(SchemaNode::Map(Box::new(SchemaNode::Any))),
            Some(AdditionalProperties::Denied) | None => Ok(SchemaNode::Object {
                fields: BTreeMap::new(),
                open: prop.x_preserve_unknown || prop.x_embedded_resource,
            }),
        }
    }
}
