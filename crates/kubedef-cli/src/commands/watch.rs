//! Keep the discovered packages fresh until interrupted

use std::sync::Arc;
use std::time::Duration;

use console::style;
use kubedef_kube::RefreshController;
use miette::{miette, IntoDiagnostic, Result};

use super::{builtin_registry, discovery_source, load_config};
use crate::DiscoveryArgs;

pub async fn run(args: &DiscoveryArgs, interval: Option<Duration>) -> Result<()> {
    let config = load_config(args)?;

    let mut refresh = config.refresh.clone();
    if interval.is_some() {
        refresh.interval = interval;
    }
    let Some(period) = refresh.interval else {
        return Err(miette!(
            "no refresh interval: set refresh.interval in the configuration or pass --interval"
        ));
    };

    let source = discovery_source(args, &config)
        .await?
        .ok_or_else(|| miette!("nothing to watch: pass --cluster or --crds"))?;

    let registry = builtin_registry()?;
    eprintln!(
        "{} watching {} every {:?} (Ctrl-C to stop)",
        style("→").dim(),
        source.describe(),
        period
    );

    let controller = RefreshController::with_source(Arc::clone(&registry), source);
    let handle = controller
        .start(&refresh)
        .ok_or_else(|| miette!("periodic refresh did not start"))?;

    tokio::signal::ctrl_c().await.into_diagnostic()?;
    handle.abort();

    println!(
        "{} {} discovered kind(s)",
        style("✓").green(),
        registry.discovered().gvks().count()
    );
    Ok(())
}
