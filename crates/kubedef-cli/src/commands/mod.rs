//! CLI commands

pub mod eval;
pub mod exists;
pub mod packages;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use kubedef_core::Registry;
use kubedef_kube::{
    ClusterCrdSource, CrdSource, KubedefConfig, ManifestCrdSource, RefreshController,
    RefreshReport,
};
use miette::{IntoDiagnostic, Result, WrapErr};

use crate::DiscoveryArgs;

/// A registry populated for one command invocation
pub struct Session {
    pub registry: Arc<Registry>,
    pub report: Option<Arc<RefreshReport>>,
}

/// Load configuration, build the builtin registry and run one refresh if a
/// CRD source was requested
pub async fn open(args: &DiscoveryArgs) -> Result<Session> {
    let config = load_config(args)?;
    let registry = builtin_registry()?;

    let report = match discovery_source(args, &config).await? {
        Some(source) => {
            tracing::debug!(source = %source.describe(), "refreshing discovered packages");
            let controller = RefreshController::with_source(Arc::clone(&registry), source);
            let report = controller
                .refresh_with_timeout(config.refresh.timeout)
                .await
                .into_diagnostic()
                .wrap_err("Failed to discover CRD packages")?;

            for skipped in &report.skipped {
                eprintln!(
                    "{} skipped {} ({}): {}",
                    style("⚠").yellow(),
                    skipped.gvk,
                    skipped.crd,
                    skipped.error
                );
            }
            Some(report)
        }
        None => {
            tracing::debug!("no CRD source configured, using built-in packages only");
            None
        }
    };

    Ok(Session { registry, report })
}

pub fn load_config(args: &DiscoveryArgs) -> Result<KubedefConfig> {
    match &args.config {
        Some(path) => KubedefConfig::load_from(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load configuration from {}", path.display())),
        None => KubedefConfig::load()
            .into_diagnostic()
            .wrap_err("Failed to load configuration"),
    }
}

pub fn builtin_registry() -> Result<Arc<Registry>> {
    let registry = Registry::with_builtin_catalogue()
        .into_diagnostic()
        .wrap_err("Failed to load the built-in catalogue")?;
    Ok(Arc::new(registry))
}

/// `--cluster` wins over manifest paths; `None` when neither is given
pub async fn discovery_source(
    args: &DiscoveryArgs,
    config: &KubedefConfig,
) -> Result<Option<Arc<dyn CrdSource>>> {
    let crd_paths: Vec<PathBuf> = args
        .crds
        .iter()
        .chain(config.crd_paths.iter())
        .cloned()
        .collect();

    if args.cluster {
        let cluster = ClusterCrdSource::try_default()
            .await
            .into_diagnostic()
            .wrap_err("Failed to connect to the cluster")?;
        Ok(Some(Arc::new(cluster)))
    } else if !crd_paths.is_empty() {
        Ok(Some(Arc::new(ManifestCrdSource::new(crd_paths))))
    } else {
        Ok(None)
    }
}
