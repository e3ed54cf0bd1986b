//! Manifest sources
//!
//! A manifest names the packages it imports, the conjunction of definitions its
//! output must satisfy, and the body itself (a MiniJinja template or a literal):
//!
//! ```yaml
//! imports:
//!   apps: k8s.io/apps/v1
//!   kube: kube/apps/v1
//! output: apps.#Deployment & kube.#Deployment
//! parameter:
//!   name: myapp
//! template: |
//!   metadata:
//!     name: {{ parameter.name }}
//! ```

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSource {
    /// Alias -> import path, in declaration order
    #[serde(default)]
    pub imports: IndexMap<String, String>,

    /// `alias.#Name & alias.#Name ...`; empty means the body is taken as-is
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub parameter: serde_json::Value,

    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub value: Option<serde_yaml::Value>,
}

/// The body of a manifest
#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Template(&'a str),
    Literal(&'a serde_yaml::Value),
}

impl ManifestSource {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let source: Self = serde_yaml::from_str(yaml)?;
        source.body()?;
        Ok(source)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Exactly one of `template` or `value`
    pub fn body(&self) -> Result<Body<'_>> {
        match (&self.template, &self.value) {
            (Some(template), None) => Ok(Body::Template(template)),
            (None, Some(value)) => Ok(Body::Literal(value)),
            (Some(_), Some(_)) => Err(EngineError::manifest(
                "`template` and `value` are mutually exclusive",
            )),
            (None, None) => Err(EngineError::manifest(
                "one of `template` or `value` is required",
            )),
        }
    }

    /// Definitions referenced by `output`, in order
    pub fn references(&self) -> Result<Vec<Reference>> {
        match &self.output {
            Some(expr) => parse_output(expr),
            None => Ok(Vec::new()),
        }
    }
}

/// `alias.#Name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub alias: String,
    pub name: String,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.name)
    }
}

/// Parse a conjunction of definition references
pub fn parse_output(expr: &str) -> Result<Vec<Reference>> {
    let mut references = Vec::new();
    for term in expr.split('&').map(str::trim) {
        let (alias, name) = term
            .split_once('.')
            .filter(|(alias, name)| {
                !alias.is_empty() && name.len() > 1 && name.starts_with('#') && !name.contains('.')
            })
            .ok_or_else(|| {
                EngineError::manifest(format!(
                    "invalid output term '{}', expected `<alias>.#<Kind>`",
                    term
                ))
            })?;
        references.push(Reference {
            alias: alias.to_string(),
            name: name.to_string(),
        });
    }
    Ok(references)
}
