//! Kubedef Engine - manifest evaluation against bound schema packages
//!
//! This crate provides:
//! - `EvaluationContext` and `bind`: attach registry packages to an evaluation
//! - `Engine`: render a manifest body with MiniJinja and unify it with definitions
//! - `convert`: evaluated values to and from `Unstructured` maps

pub mod context;
pub mod convert;
pub mod engine;
pub mod error;
pub mod filters;
pub mod manifest;
pub mod unify;
pub mod value;

pub use context::{bind, EvaluationContext};
pub use convert::{from_structured_map, to_structured_map, Unstructured};
pub use engine::{Engine, EngineBuilder, EvaluatedResult};
pub use error::{ConvertError, EngineError, Result, TemplateError, TemplateErrorKind};
pub use manifest::{ManifestSource, Reference};
pub use value::{Bottom, BottomKind, Value};
