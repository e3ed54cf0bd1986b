//! Kubedef Kube - cluster schema discovery
//!
//! This crate keeps a `Registry`'s discovered partition in line with the CRDs a
//! cluster serves:
//! - `CrdSource`: where CRDs come from (cluster, manifests on disk, mock)
//! - `RefreshController`: serialized, atomic, deadline-bounded refresh
//! - `KubedefConfig`: refresh timing and offline CRD paths

pub mod config;
pub mod error;
pub mod refresh;
pub mod source;

pub use config::{KubedefConfig, RefreshConfig};
pub use error::{KubeError, Result};
pub use refresh::{build_partition, RefreshController, RefreshReport, SkippedVersion};
pub use source::{ClusterCrdSource, CrdSource, ManifestCrdSource, MockCrdSource, SourceCounts};
