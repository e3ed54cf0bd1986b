//! Manifest evaluator based on MiniJinja

use std::sync::Arc;

use kubedef_core::TypeDefinition;
use minijinja::Environment;
use tracing::{debug, instrument};

use crate::context::EvaluationContext;
use crate::error::{EngineError, Result, TemplateError};
use crate::filters;
use crate::manifest::{Body, ManifestSource};
use crate::unify::{unify, ROOT_LABEL};
use crate::value::{BottomKind, Value};

/// Output of evaluating one manifest
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedResult {
    value: Value,
    /// `alias.#Name` terms the value was unified with
    references: Vec<String>,
}

impl EvaluatedResult {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            references: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }
}

/// Engine builder
pub struct EngineBuilder {
    strict_mode: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Set strict mode (fail on undefined template variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn build(self) -> Engine {
        Engine::new(self.strict_mode)
    }
}

/// The manifest evaluator
pub struct Engine {
    strict_mode: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Engine {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("b64decode", filters::b64decode);
        env.add_filter("quote", filters::quote);
        env.add_filter("indent", filters::indent);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("dnslabel", filters::dnslabel);

        env
    }

    /// Render a template string with `parameter` in scope
    pub fn render_string(
        &self,
        template: &str,
        parameter: &serde_json::Value,
        template_name: &str,
    ) -> Result<String> {
        let mut env = self.create_environment();

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template))?;

        let tmpl = env
            .get_template(template_name)
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template))?;

        let ctx = minijinja::context! {
            parameter => parameter,
        };

        tmpl.render(ctx)
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template).into())
    }

    /// Evaluate a manifest against the packages bound in `ctx`.
    ///
    /// Missing import paths and unknown aliases are errors. A referenced
    /// definition the package does not export is not: it yields a bottom value
    /// (`undefined field "#Name"`) for the converter to report.
    #[instrument(skip_all)]
    pub fn evaluate(&self, ctx: &EvaluationContext, source: &ManifestSource) -> Result<EvaluatedResult> {
        let references = source.references()?;

        let mut resolved = Vec::with_capacity(source.imports.len());
        for (alias, path) in &source.imports {
            let package = ctx
                .package(path)
                .ok_or_else(|| EngineError::PackageNotFound { path: path.clone() })?;
            resolved.push((alias.as_str(), package));
        }

        let mut definitions: Vec<std::result::Result<Arc<TypeDefinition>, String>> = Vec::new();
        for reference in &references {
            let (_, package) = resolved
                .iter()
                .find(|(alias, _)| *alias == reference.alias)
                .ok_or_else(|| EngineError::UnknownReference {
                    reference: reference.alias.clone(),
                })?;
            definitions.push(
                package
                    .get(&reference.name)
                    .cloned()
                    .ok_or_else(|| reference.name.clone()),
            );
        }

        let body = self.evaluate_body(source)?;
        let references: Vec<String> = references.iter().map(ToString::to_string).collect();

        if let Some(missing) = definitions.iter().find_map(|d| d.as_ref().err()) {
            debug!(definition = %missing, "output references an undefined definition");
            return Ok(EvaluatedResult {
                value: Value::bottom(
                    BottomKind::UndefinedField,
                    format!("undefined field {:?}", missing),
                ),
                references,
            });
        }

        let value = definitions
            .into_iter()
            .flatten()
            .fold(body, |value, definition| unify(&definition.root, value, ROOT_LABEL));

        Ok(EvaluatedResult { value, references })
    }

    /// Parse and evaluate manifest YAML
    pub fn evaluate_str(&self, ctx: &EvaluationContext, manifest: &str) -> Result<EvaluatedResult> {
        let source = ManifestSource::from_yaml(manifest)?;
        self.evaluate(ctx, &source)
    }

    fn evaluate_body(&self, source: &ManifestSource) -> Result<Value> {
        let parameter = if source.parameter.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            source.parameter.clone()
        };

        let yaml = match source.body()? {
            Body::Literal(value) => value.clone(),
            Body::Template(template) => {
                let rendered = self.render_string(template, &parameter, "template")?;
                serde_yaml::from_str(&rendered)?
            }
        };

        // An empty document is an empty struct, not null
        Ok(match Value::from_yaml(yaml) {
            Value::Null => Value::empty_struct(),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;
    use kubedef_core::Registry;

    fn bound() -> EvaluationContext {
        EvaluationContext::bound(&Registry::with_builtin_catalogue().unwrap())
    }

    #[test]
    fn test_render_string_with_parameter() {
        let engine = Engine::default();
        let out = engine
            .render_string(
                "name: {{ parameter.name | quote }}",
                &serde_json::json!({"name": "web"}),
                "t",
            )
            .unwrap();
        assert_eq!(out, "name: \"web\"");
    }

    #[test]
    fn test_strict_mode_rejects_undefined() {
        let engine = Engine::default();
        let err = engine
            .render_string("{{ parameter.missing.deep }}", &serde_json::json!({}), "t")
            .unwrap_err();
        assert!(matches!(err, EngineError::Template(_)));

        let lenient = Engine::builder().strict(false).build();
        assert!(lenient.render_string("{{ nothing }}", &serde_json::json!({}), "t").is_ok());
    }

    #[test]
    fn test_parameters_typo_is_diagnosed() {
        let err = Engine::default()
            .render_string("name: {{ parameters.name }}", &serde_json::json!({"name": "web"}), "t")
            .unwrap_err();
        let EngineError::Template(err) = err else {
            panic!("expected a template error");
        };
        assert_eq!(err.kind(), TemplateErrorKind::UndefinedVariable);
        assert!(err.suggestion.unwrap().contains("`parameter`"));
    }

    #[test]
    fn test_unknown_import_path() {
        let err = Engine::default()
            .evaluate_str(
                &bound(),
                "imports: {x: k8s.io/nothing/v1}\noutput: x.#Thing\nvalue: {}\n",
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::PackageNotFound { path } if path == "k8s.io/nothing/v1"));
    }

    #[test]
    fn test_unknown_alias() {
        let err = Engine::default()
            .evaluate_str(&bound(), "imports: {v1: k8s.io/core/v1}\noutput: core.#Secret\nvalue: {}\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownReference { reference } if reference == "core"));
    }

    #[test]
    fn test_undefined_definition_is_bottom() {
        let result = Engine::default()
            .evaluate_str(
                &bound(),
                "imports: {v1: k8s.io/networking/v1}\noutput: v1.#Deployment\nvalue: {}\n",
            )
            .unwrap();
        assert_eq!(
            result.value(),
            &Value::bottom(BottomKind::UndefinedField, "undefined field \"#Deployment\"")
        );
    }

    #[test]
    fn test_without_output_body_is_untouched() {
        let result = Engine::default()
            .evaluate_str(&bound(), "value: {anything: [1, 2]}\n")
            .unwrap();
        assert_eq!(result.value(), &Value::from_json(serde_json::json!({"anything": [1, 2]})));
        assert!(result.references().is_empty());
    }
}
