//! List importable packages

use console::style;
use kubedef_core::Origin;
use miette::Result;

use super::open;
use crate::DiscoveryArgs;

pub async fn run(args: &DiscoveryArgs, prefix: Option<&str>) -> Result<()> {
    let session = open(args).await?;
    let snapshot = session.registry.snapshot();

    let packages: Vec<_> = snapshot
        .packages()
        .into_iter()
        .filter(|package| prefix.is_none_or(|p| package.path().starts_with(p)))
        .collect();

    if packages.is_empty() {
        println!("{}", style("No packages match").dim());
        return Ok(());
    }

    for package in &packages {
        println!("{}", style(package.path()).cyan().bold());
        for definition in package.definitions() {
            let origin = match definition.origin {
                Origin::Builtin => style("builtin").dim(),
                Origin::Crd => style("crd").yellow(),
            };
            println!("  {} {}", definition.name(), origin);
        }
    }

    if let Some(report) = &session.report {
        eprintln!(
            "\n{} {} package(s), {} CRD(s) discovered in {:.0?}",
            style("→").dim(),
            packages.len(),
            report.crds,
            report.elapsed
        );
    }

    Ok(())
}
