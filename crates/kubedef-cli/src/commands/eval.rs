//! Evaluate a manifest against the registry

use std::path::Path;

use kubedef_engine::{to_structured_map, Engine, EngineError, EvaluationContext, ManifestSource};
use miette::{IntoDiagnostic, Result, WrapErr};

use super::open;
use crate::{DiscoveryArgs, OutputFormat};

pub async fn run(args: &DiscoveryArgs, file: &Path, format: OutputFormat) -> Result<()> {
    let source = ManifestSource::load(file)
        .map_err(diagnose)
        .wrap_err_with(|| format!("Failed to load manifest {}", file.display()))?;

    let session = open(args).await?;
    let ctx = EvaluationContext::bound(&session.registry);

    let result = Engine::default().evaluate(&ctx, &source).map_err(diagnose)?;
    let object = to_structured_map(&result).map_err(|e| miette::miette!("{}", e))?;

    let rendered = match format {
        OutputFormat::Yaml => object.to_yaml().into_diagnostic()?,
        OutputFormat::Json => object.to_json_pretty().into_diagnostic()? + "\n",
    };
    print!("{}", rendered);

    Ok(())
}

/// Template errors carry source spans; everything else is reported as text
fn diagnose(err: EngineError) -> miette::Report {
    match err {
        EngineError::Template(e) => miette::Report::new(e),
        other => miette::miette!("{}", other),
    }
}
