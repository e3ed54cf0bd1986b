//! Core error types

use thiserror::Error;

/// A structural schema that could not be turned into a type definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{gvk}: version has no openAPIV3Schema")]
    MissingSchema { gvk: String },

    #[error("{gvk}: unsupported schema type '{type_name}' at {path}")]
    UnsupportedType {
        gvk: String,
        path: String,
        type_name: String,
    },

    #[error("{gvk}: schema nesting exceeds {limit} levels at {path}")]
    TooDeep {
        gvk: String,
        path: String,
        limit: usize,
    },

    #[error("unresolved schema reference '{reference}'")]
    UnresolvedRef { reference: String },
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Package not found: {path}")]
    PackageNotFound { path: String },

    #[error("Type {name} not found in package {path}")]
    TypeNotFound { path: String, name: String },

    #[error("Invalid CRD: {message}")]
    InvalidCrd { message: String },

    #[error("Invalid group/version/kind: {0}")]
    InvalidGvk(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether this is a registry miss (package or type symbol)
    pub fn is_registry_miss(&self) -> bool {
        matches!(
            self,
            CoreError::PackageNotFound { .. } | CoreError::TypeNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
