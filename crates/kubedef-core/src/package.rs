//! Packages and import paths
//!
//! Every kind is exported under two import path families:
//!
//! | family     | built-in kinds                   | CRD kinds                |
//! |------------|----------------------------------|--------------------------|
//! | strict     | `k8s.io/<short-group>/<version>` | `<group>/<version>`      |
//! | permissive | `kube/<group>/<version>`         | `kube/<group>/<version>` |
//!
//! The core group collapses to `k8s.io/core/v1` and `kube/v1`; a groupless CRD
//! (only constructible by hand, the parser requires `spec.group`) to `v1`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::gvk::Gvk;
use crate::schema::{Origin, TypeDefinition};

/// Host under which canonical built-in schemas are published
pub const BUILTIN_HOST: &str = "k8s.io";

/// Prefix of the permissive path family
pub const PERMISSIVE_PREFIX: &str = "kube";

/// Permissive import path for a GVK
pub fn permissive_path(gvk: &Gvk) -> String {
    if gvk.group.is_empty() {
        format!("{}/{}", PERMISSIVE_PREFIX, gvk.version)
    } else {
        format!("{}/{}/{}", PERMISSIVE_PREFIX, gvk.group, gvk.version)
    }
}

/// Strict import path for a definition, if its origin has one
pub fn strict_path(definition: &TypeDefinition) -> Option<String> {
    let gvk = &definition.gvk;
    match definition.origin {
        Origin::Builtin => {
            let short_group = gvk.group.split('.').next().filter(|g| !g.is_empty()).unwrap_or("core");
            Some(format!("{}/{}/{}", BUILTIN_HOST, short_group, gvk.version))
        }
        // A CRD owns its whole group, so the group itself is the strict namespace
        Origin::Crd if gvk.group.is_empty() => Some(gvk.version.clone()),
        Origin::Crd => Some(format!("{}/{}", gvk.group, gvk.version)),
    }
}

/// Type definitions importable from one path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    path: String,
    definitions: BTreeMap<String, Arc<TypeDefinition>>,
}

impl Package {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            definitions: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Insert or replace a definition under its `#Kind` name.
    /// Returns false when an identical definition was already present.
    pub fn insert(&mut self, definition: Arc<TypeDefinition>) -> bool {
        let name = definition.name();
        match self.definitions.get(&name) {
            Some(existing) if **existing == *definition => false,
            _ => {
                self.definitions.insert(name, definition);
                true
            }
        }
    }

    /// Look up a type by its exported name (`#Kind`)
    pub fn get(&self, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Arc<TypeDefinition>> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;

    fn definition(group: &str, version: &str, kind: &str, origin: Origin) -> TypeDefinition {
        TypeDefinition {
            gvk: Gvk::new(group, version, kind),
            origin,
            root: SchemaNode::Any,
        }
    }

    #[test]
    fn test_permissive_paths() {
        assert_eq!(permissive_path(&Gvk::new("", "v1", "Secret")), "kube/v1");
        assert_eq!(
            permissive_path(&Gvk::new("networking.k8s.io", "v1beta1", "Ingress")),
            "kube/networking.k8s.io/v1beta1"
        );
    }

    #[test]
    fn test_strict_paths() {
        let secret = definition("", "v1", "Secret", Origin::Builtin);
        assert_eq!(strict_path(&secret).as_deref(), Some("k8s.io/core/v1"));

        let ingress = definition("networking.k8s.io", "v1", "Ingress", Origin::Builtin);
        assert_eq!(strict_path(&ingress).as_deref(), Some("k8s.io/networking/v1"));

        let foo = definition("example.com", "v1", "Foo", Origin::Crd);
        assert_eq!(strict_path(&foo).as_deref(), Some("example.com/v1"));

        let groupless = definition("", "v1", "Odd", Origin::Crd);
        assert_eq!(strict_path(&groupless).as_deref(), Some("v1"));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut package = Package::new("example.com/v1");
        let foo = Arc::new(definition("example.com", "v1", "Foo", Origin::Crd));

        assert!(package.insert(foo.clone()));
        assert!(!package.insert(Arc::new((*foo).clone())));
        assert_eq!(package.len(), 1);
        assert!(package.contains("#Foo"));
        assert_eq!(package.names().collect::<Vec<_>>(), vec!["#Foo"]);
    }
}
