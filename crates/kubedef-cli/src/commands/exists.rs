//! Check whether a kind is registered

use console::style;
use kubedef_core::Gvk;
use miette::{IntoDiagnostic, Result};

use super::open;
use crate::DiscoveryArgs;

/// Returns whether the kind is known
pub async fn run(args: &DiscoveryArgs, gvk: &str) -> Result<bool> {
    let gvk: Gvk = gvk.parse().into_diagnostic()?;
    let session = open(args).await?;

    if session.registry.builtin().exist(&gvk) {
        println!("{} {} {}", style("✓").green(), gvk, style("(builtin)").dim());
        Ok(true)
    } else if session.registry.discovered().exist(&gvk) {
        println!("{} {} {}", style("✓").green(), gvk, style("(crd)").yellow());
        Ok(true)
    } else {
        println!("{} {} is not a known kind", style("✗").red(), gvk);
        Ok(false)
    }
}
