//! Type definitions produced by the translator
//!
//! `SchemaNode` is the closed set of shapes a Kubernetes structural schema can
//! describe. The evaluator unifies user values against these nodes; it never sees
//! raw OpenAPI.

use std::collections::BTreeMap;
use std::fmt;

use crate::gvk::Gvk;

/// Scalar leaf types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    /// Numeric constrained to integral values
    Integer,
    /// Any numeric value
    Number,
    Boolean,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "int"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "bool"),
        }
    }
}

/// A field of an object node
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub node: SchemaNode,
    pub required: bool,
}

impl Field {
    pub fn optional(node: SchemaNode) -> Self {
        Self {
            node,
            required: false,
        }
    }

    pub fn required(node: SchemaNode) -> Self {
        Self {
            node,
            required: true,
        }
    }
}

/// Structural description of a type
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Known fields; `open` permits additional untyped fields
    Object {
        fields: BTreeMap<String, Field>,
        open: bool,
    },
    /// String-keyed map with homogeneous values
    Map(Box<SchemaNode>),
    Array(Box<SchemaNode>),
    Scalar(ScalarKind),
    IntOrString,
    /// A fixed string value
    Literal(String),
    Any,
}

impl SchemaNode {
    pub fn closed(fields: BTreeMap<String, Field>) -> Self {
        SchemaNode::Object {
            fields,
            open: false,
        }
    }

    pub fn string() -> Self {
        SchemaNode::Scalar(ScalarKind::String)
    }

    /// Short name used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            SchemaNode::Object { .. } => "struct".to_string(),
            SchemaNode::Map(_) => "map".to_string(),
            SchemaNode::Array(_) => "list".to_string(),
            SchemaNode::Scalar(kind) => kind.to_string(),
            SchemaNode::IntOrString => "int | string".to_string(),
            SchemaNode::Literal(value) => format!("{:?}", value),
            SchemaNode::Any => "_".to_string(),
        }
    }

    /// Look up a direct field of an object node
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            SchemaNode::Object { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Follow a dot-separated path through object fields
    pub fn get_path(&self, path: &str) -> Option<&SchemaNode> {
        let mut current = self;
        for part in path.split('.') {
            current = &current.field(part)?.node;
        }
        Some(current)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SchemaNode::Object { open: true, .. })
    }

    /// Depth of the deepest path in this tree
    pub fn depth(&self) -> usize {
        match self {
            SchemaNode::Object { fields, .. } => {
                1 + fields.values().map(|f| f.node.depth()).max().unwrap_or(0)
            }
            SchemaNode::Map(inner) | SchemaNode::Array(inner) => 1 + inner.depth(),
            _ => 1,
        }
    }
}

/// Where a definition's schema came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The bundled, version-pinned catalogue
    Builtin,
    /// A CustomResourceDefinition listed from the cluster
    Crd,
}

/// A named type scoped to one GVK
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub gvk: Gvk,
    pub origin: Origin,
    /// Root node; always an object carrying literal `kind` and `apiVersion`
    pub root: SchemaNode,
}

impl TypeDefinition {
    /// Exported name (`#Kind`)
    pub fn name(&self) -> String {
        self.gvk.definition_name()
    }

    /// Literal `kind` value the definition produces
    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    /// Literal `apiVersion` value the definition produces
    pub fn api_version(&self) -> String {
        self.gvk.api_version()
    }
}

/// Standard object metadata, injected wherever a schema leaves `metadata` undescribed
pub fn object_meta() -> SchemaNode {
    let string_map = || SchemaNode::Map(Box::new(SchemaNode::string()));
    let fields = [
        ("name", SchemaNode::string()),
        ("generateName", SchemaNode::string()),
        ("namespace", SchemaNode::string()),
        ("labels", string_map()),
        ("annotations", string_map()),
        ("finalizers", SchemaNode::Array(Box::new(SchemaNode::string()))),
        ("ownerReferences", SchemaNode::Array(Box::new(SchemaNode::Any))),
        ("uid", SchemaNode::string()),
        ("resourceVersion", SchemaNode::string()),
        ("generation", SchemaNode::Scalar(ScalarKind::Integer)),
        ("creationTimestamp", SchemaNode::string()),
        ("deletionTimestamp", SchemaNode::string()),
        ("managedFields", SchemaNode::Array(Box::new(SchemaNode::Any))),
    ];

    SchemaNode::closed(
        fields
            .into_iter()
            .map(|(name, node)| (name.to_string(), Field::optional(node)))
            .collect(),
    )
}
