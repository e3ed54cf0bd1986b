//! CustomResourceDefinition model and parsing

mod parser;
mod schema;

pub use parser::CrdParser;
pub use schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdVersion, PropertyType,
    SchemaProperty,
};
