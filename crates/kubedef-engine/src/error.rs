//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors that stop an evaluation before a value is produced.
///
/// Problems *inside* the value (conflicts, incomplete fields, undefined
/// definitions) are not errors here; they are carried as bottom or incomplete
/// values so the converter can report them verbatim.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error")]
    Template(#[from] TemplateError),

    #[error("Invalid manifest: {message}")]
    Manifest { message: String },

    #[error("package \"{path}\" not found")]
    PackageNotFound { path: String },

    #[error("reference \"{reference}\" not found")]
    UnknownReference { reference: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

/// Template rendering error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(kubedef::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let kind = categorize(&err);
        let message = err
            .to_string()
            .replace("invalid operation: ", "")
            .replace("syntax error: ", "")
            .replace("undefined value", "undefined variable");
        let span = err.line().and_then(|line| calculate_span(template_source, line));
        let suggestion = suggest(kind, &format!("{:#}", err));

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

fn categorize(err: &minijinja::Error) -> TemplateErrorKind {
    match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => TemplateErrorKind::Other,
    }
}

fn suggest(kind: TemplateErrorKind, detail: &str) -> Option<String> {
    match kind {
        TemplateErrorKind::UndefinedVariable if detail.contains("parameters") => Some(
            "Did you mean `parameter`? Manifest values are exposed as `parameter` (singular)."
                .to_string(),
        ),
        TemplateErrorKind::UndefinedVariable => {
            Some("Only `parameter` is available inside a manifest template.".to_string())
        }
        TemplateErrorKind::UnknownFilter => Some(format!(
            "Available filters: {}",
            crate::filters::AVAILABLE_FILTERS.join(", ")
        )),
        TemplateErrorKind::TypeError | TemplateErrorKind::InvalidOperation
            if detail.contains("not iterable") => Some(
            "To iterate over a mapping use `|items`, e.g. `{% for k, v in parameter.http|items %}`"
                .to_string(),
        ),
        _ => None,
    }
}

/// Span covering the whole of a 1-based line
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;
    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }
    None
}

/// Failure converting an evaluated value into a structured map
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// A field has no concrete value
    #[error("{0}")]
    IncompleteValue(String),

    /// A referenced definition does not exist
    #[error("{0}")]
    Undefined(String),

    /// Unification failed (conflicting values, field not allowed)
    #[error("{0}")]
    Conflict(String),

    /// NaN or an infinity, which JSON cannot carry
    #[error("{0}")]
    NonFinite(String),

    #[error("evaluated result is {0}, not an object")]
    NotAnObject(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
