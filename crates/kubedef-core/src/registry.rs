//! Package registry
//!
//! The registry holds two partitions with independent lifecycles:
//!
//! - **builtin**: translated once from the catalogue at construction, never mutated
//! - **discovered**: CRD-backed, replaced wholesale by each successful refresh
//!
//! The discovered partition sits behind an `ArcSwap`. Writers build a complete
//! `Partition` off to the side and publish it with a single pointer swap, so a
//! reader holding a `RegistrySnapshot` sees either the old or the new partition
//! in full, never a mix.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::catalogue::Catalogue;
use crate::error::{CoreError, Result};
use crate::gvk::Gvk;
use crate::package::{permissive_path, strict_path, Package};
use crate::schema::TypeDefinition;
use crate::translate::Translator;

/// Paths a definition was registered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub permissive: String,
    pub strict: Option<String>,
}

/// A self-contained set of packages plus the GVKs they define
#[derive(Debug, Clone, Default)]
pub struct Partition {
    packages: BTreeMap<String, Package>,
    known: BTreeSet<Gvk>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate every catalogue entry into a partition
    pub fn from_catalogue(catalogue: &Catalogue) -> Result<Self> {
        let mut partition = Self::new();
        for entry in catalogue.entries() {
            let definition = Translator::translate_builtin(entry)?;
            partition.register(definition);
        }
        Ok(partition)
    }

    /// Insert or replace one definition under one path. Re-inserting an
    /// identical definition changes nothing; returns whether anything changed.
    pub fn put(&mut self, path: &str, gvk: &Gvk, definition: Arc<TypeDefinition>) -> bool {
        let inserted = self
            .packages
            .entry(path.to_string())
            .or_insert_with(|| Package::new(path))
            .insert(definition);
        let newly_known = self.known.insert(gvk.clone());
        inserted || newly_known
    }

    /// Register a definition under the permissive path and, when it has one,
    /// its strict path
    pub fn register(&mut self, definition: TypeDefinition) -> Registration {
        let gvk = definition.gvk.clone();
        let permissive = permissive_path(&gvk);
        let strict = strict_path(&definition);
        let definition = Arc::new(definition);

        self.put(&permissive, &gvk, Arc::clone(&definition));
        if let Some(path) = &strict {
            self.put(path, &gvk, definition);
        }

        Registration { permissive, strict }
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    pub fn lookup(&self, path: &str, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.packages.get(path)?.get(name)
    }

    pub fn exist(&self, gvk: &Gvk) -> bool {
        self.known.contains(gvk)
    }

    pub fn gvks(&self) -> impl Iterator<Item = &Gvk> {
        self.known.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Process-wide schema registry, shared by `Arc`
pub struct Registry {
    builtin: Arc<Partition>,
    discovered: ArcSwap<Partition>,
}

impl Registry {
    /// Create a registry around an already-built builtin partition
    pub fn new(builtin: Partition) -> Self {
        Self {
            builtin: Arc::new(builtin),
            discovered: ArcSwap::from_pointee(Partition::new()),
        }
    }

    /// Create a registry whose builtin partition is the bundled catalogue
    pub fn with_builtin_catalogue() -> Result<Self> {
        let builtin = Partition::from_catalogue(Catalogue::builtin()?)?;
        info!(
            packages = builtin.len(),
            kinds = builtin.gvks().count(),
            "loaded builtin schema catalogue"
        );
        Ok(Self::new(builtin))
    }

    /// Point-in-time view over both partitions
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            builtin: Arc::clone(&self.builtin),
            discovered: self.discovered.load_full(),
        }
    }

    /// True iff the GVK has a definition in either partition
    pub fn exist(&self, gvk: &Gvk) -> bool {
        self.builtin.exist(gvk) || self.discovered.load().exist(gvk)
    }

    pub fn lookup(&self, path: &str, name: &str) -> Option<Arc<TypeDefinition>> {
        self.snapshot().lookup(path, name)
    }

    /// Like `lookup`, but tells a missing package apart from a missing type
    pub fn require(&self, path: &str, name: &str) -> Result<Arc<TypeDefinition>> {
        self.snapshot().require(path, name)
    }

    pub fn builtin(&self) -> &Arc<Partition> {
        &self.builtin
    }

    pub fn discovered(&self) -> Arc<Partition> {
        self.discovered.load_full()
    }

    /// Publish a fully built discovered partition, returning the one it replaced.
    ///
    /// Only the refresh path should call this; everything else reads.
    pub fn replace_discovered(&self, partition: Partition) -> Arc<Partition> {
        let next = Arc::new(partition);
        debug!(
            packages = next.len(),
            kinds = next.gvks().count(),
            "publishing discovered partition"
        );
        self.discovered.swap(next)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("builtin_packages", &self.builtin.len())
            .field("discovered_packages", &self.discovered.load().len())
            .finish()
    }
}

/// Immutable merged view of both partitions at one instant
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    builtin: Arc<Partition>,
    discovered: Arc<Partition>,
}

impl RegistrySnapshot {
    pub fn exist(&self, gvk: &Gvk) -> bool {
        self.builtin.exist(gvk) || self.discovered.exist(gvk)
    }

    /// Builtin definitions take precedence over discovered ones of the same name
    pub fn lookup(&self, path: &str, name: &str) -> Option<Arc<TypeDefinition>> {
        self.builtin
            .lookup(path, name)
            .or_else(|| self.discovered.lookup(path, name))
            .cloned()
    }

    pub fn require(&self, path: &str, name: &str) -> Result<Arc<TypeDefinition>> {
        if self.builtin.package(path).is_none() && self.discovered.package(path).is_none() {
            return Err(CoreError::PackageNotFound {
                path: path.to_string(),
            });
        }
        self.lookup(path, name).ok_or_else(|| CoreError::TypeNotFound {
            path: path.to_string(),
            name: name.to_string(),
        })
    }

    /// The merged package at `path`
    pub fn package(&self, path: &str) -> Option<Package> {
        match (self.builtin.package(path), self.discovered.package(path)) {
            (None, None) => None,
            (Some(builtin), None) => Some(builtin.clone()),
            (None, Some(discovered)) => Some(discovered.clone()),
            (Some(builtin), Some(discovered)) => Some(merge(builtin, discovered)),
        }
    }

    /// Every merged package, ordered by path
    pub fn packages(&self) -> Vec<Package> {
        self.paths()
            .into_iter()
            .filter_map(|path| self.package(&path))
            .collect()
    }

    pub fn paths(&self) -> BTreeSet<String> {
        self.builtin
            .paths()
            .chain(self.discovered.paths())
            .map(String::from)
            .collect()
    }

    pub fn gvks(&self) -> BTreeSet<Gvk> {
        self.builtin
            .gvks()
            .chain(self.discovered.gvks())
            .cloned()
            .collect()
    }
}

fn merge(builtin: &Package, discovered: &Package) -> Package {
    let mut merged = builtin.clone();
    for definition in discovered.definitions() {
        if merged.contains(&definition.name()) {
            debug!(
                path = builtin.path(),
                name = %definition.name(),
                "discovered definition shadowed by builtin"
            );
            continue;
        }
        merged.insert(Arc::clone(definition));
    }
    merged
}
