//! Kubedef Core - schema translation and the package registry
//!
//! This crate turns Kubernetes structural schemas into importable type
//! definitions:
//! - `Gvk`: group/version/kind identity
//! - `crd`: CustomResourceDefinition model and parser
//! - `Translator`: OpenAPI v3 schema to `TypeDefinition`
//! - `Catalogue`: bundled built-in kinds
//! - `Package`: definitions importable from one path
//! - `Registry`: builtin and discovered partitions behind an atomic swap

pub mod catalogue;
pub mod crd;
pub mod error;
pub mod gvk;
pub mod package;
pub mod registry;
pub mod schema;
pub mod translate;

pub use catalogue::{Catalogue, CatalogueEntry};
pub use crd::{CrdParser, CrdSchema, CrdVersion, SchemaProperty};
pub use error::{CoreError, Result, SchemaError};
pub use gvk::Gvk;
pub use package::{permissive_path, strict_path, Package};
pub use registry::{Partition, Registration, Registry, RegistrySnapshot};
pub use schema::{Field, Origin, ScalarKind, SchemaNode, TypeDefinition};
pub use translate::Translator;
