//! Sources of CustomResourceDefinitions
//!
//! - **Cluster**: list `apiextensions.k8s.io/v1` CRDs from the API server
//! - **Manifest**: read CRD YAML files from local directories
//! - **Mock**: in-memory, for tests

mod cluster;
mod manifest;
mod mock;

pub use cluster::ClusterCrdSource;
pub use manifest::ManifestCrdSource;
pub use mock::{MockCrdSource, SourceCounts};

use async_trait::async_trait;
use kubedef_core::CrdSchema;

use crate::error::Result;

/// Lists the CRDs currently installed
///
/// Implementations must be Send + Sync for use across async tasks. A listing
/// either succeeds as a whole or fails; partial listings are never returned.
#[async_trait]
pub trait CrdSource: Send + Sync {
    async fn list_crds(&self) -> Result<Vec<CrdSchema>>;

    /// Short label used in logs
    fn describe(&self) -> String {
        "crd source".to_string()
    }
}

#[async_trait]
impl<T: CrdSource + ?Sized> CrdSource for std::sync::Arc<T> {
    async fn list_crds(&self) -> Result<Vec<CrdSchema>> {
        (**self).list_crds().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
