//! Evaluation context and the namespace binder

use std::collections::BTreeMap;

use kubedef_core::{Package, Registry};
use tracing::debug;

/// Packages visible to one evaluation, keyed by import path.
///
/// A bound context holds its own copies of the packages, so a refresh that
/// completes after binding does not change what an evaluation sees.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    packages: BTreeMap<String, Package>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with every registered package bound
    pub fn bound(registry: &Registry) -> Self {
        let mut ctx = Self::new();
        bind(registry, &mut ctx);
        ctx
    }

    /// Add or replace the package at its path
    pub fn insert_package(&mut self, package: Package) {
        self.packages.insert(package.path().to_string(), package);
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Bind every package of the registry's current merged view into `ctx`.
///
/// Returns the number of packages bound.
pub fn bind(registry: &Registry, ctx: &mut EvaluationContext) -> usize {
    let snapshot = registry.snapshot();
    let packages = snapshot.packages();
    let count = packages.len();

    for package in packages {
        ctx.insert_package(package);
    }

    debug!(packages = count, "bound registry packages to evaluation context");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubedef_core::{Gvk, Origin, Partition, SchemaNode, TypeDefinition};

    fn foo_partition() -> Partition {
        let mut partition = Partition::new();
        partition.register(TypeDefinition {
            gvk: Gvk::new("example.com", "v1", "Foo"),
            origin: Origin::Crd,
            root: SchemaNode::Any,
        });
        partition
    }

    #[test]
    fn test_bound_contains_both_path_families() {
        let registry = Registry::with_builtin_catalogue().unwrap();
        let ctx = EvaluationContext::bound(&registry);

        for path in ["k8s.io/core/v1", "kube/v1", "k8s.io/apps/v1", "kube/apps/v1"] {
            assert!(ctx.package(path).is_some(), "missing {}", path);
        }
        assert!(ctx.package("example.com/v1").is_none());
    }

    #[test]
    fn test_binding_is_a_snapshot() {
        let registry = Registry::with_builtin_catalogue().unwrap();
        let before = EvaluationContext::bound(&registry);

        registry.replace_discovered(foo_partition());
        let after = EvaluationContext::bound(&registry);

        assert!(before.package("example.com/v1").is_none());
        assert!(after.package("example.com/v1").is_some());
        assert!(after.package("kube/example.com/v1").unwrap().contains("#Foo"));
    }

    #[test]
    fn test_bind_reports_count() {
        let registry = Registry::new(foo_partition());
        let mut ctx = EvaluationContext::new();
        assert_eq!(bind(&registry, &mut ctx), 2);
        assert_eq!(ctx.len(), 2);
    }
}
