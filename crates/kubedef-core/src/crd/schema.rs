//! CRD schema representation
//!
//! A loosely-typed view of a CustomResourceDefinition, as listed from the cluster
//! or read from a manifest. Nothing here is validated beyond what parsing needs;
//! deciding whether a shape is translatable is the translator's job.

use std::collections::BTreeMap;

use crate::gvk::Gvk;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// Full CRD name (e.g., "foos.example.com")
    pub name: String,
    /// API group (e.g., "example.com")
    pub group: String,
    /// Resource names
    pub names: CrdNames,
    /// API versions with their schemas
    pub versions: Vec<CrdVersion>,
}

impl CrdSchema {
    /// Get all served versions
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersion> {
        self.versions.iter().filter(|v| v.served)
    }

    /// GVK for one of this CRD's versions
    pub fn gvk(&self, version: &CrdVersion) -> Gvk {
        Gvk::new(&self.group, &version.name, &self.names.kind)
    }
}

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    /// Kind (e.g., "Foo")
    pub kind: String,
    /// Plural name (e.g., "foos")
    pub plural: String,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersion {
    /// Version name (e.g., "v1", "v1beta1")
    pub name: String,
    /// Whether this version is served by the API server
    pub served: bool,
    /// Whether this is the storage version
    pub storage: bool,
    /// The version's `openAPIV3Schema`
    pub schema: Option<SchemaProperty>,
}

/// One node of an OpenAPI v3 structural schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    /// Declared `type`; `None` when the schema leaves it unspecified
    pub type_: Option<PropertyType>,
    /// Nested object properties
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    /// Required nested properties
    pub required: Vec<String>,
    /// Array item schema
    pub items: Option<Box<SchemaProperty>>,
    /// Additional properties for objects
    pub additional_properties: Option<AdditionalProperties>,
    /// `x-kubernetes-preserve-unknown-fields`
    pub x_preserve_unknown: bool,
    /// `x-kubernetes-embedded-resource`
    pub x_embedded_resource: bool,
    /// `x-kubernetes-int-or-string`
    pub x_int_or_string: bool,
}

impl SchemaProperty {
    pub fn string() -> Self {
        Self::typed(PropertyType::String)
    }

    pub fn integer() -> Self {
        Self::typed(PropertyType::Integer)
    }

    pub fn typed(type_: PropertyType) -> Self {
        Self {
            type_: Some(type_),
            ..Default::default()
        }
    }

    /// Create an object property with nested properties
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            type_: Some(PropertyType::Object),
            properties: Some(properties),
            ..Default::default()
        }
    }

    /// Create an array property with item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            type_: Some(PropertyType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Get a nested property by path (dot-separated)
    pub fn get_nested(&self, path: &str) -> Option<&SchemaProperty> {
        let mut current = self;
        for part in path.split('.') {
            current = current.properties.as_ref()?.get(part)?;
        }
        Some(current)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Property type in OpenAPI schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// A type name the schema dialect does not define
    Unknown(String),
}

impl PropertyType {
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Additional properties configuration for objects
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Denied,
    /// Additional properties must match a schema
    Schema(Box<SchemaProperty>),
}
