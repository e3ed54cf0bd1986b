//! Error types for kubedef-kube

use std::time::Duration;

use thiserror::Error;

/// Result type for kubedef-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while discovering cluster schema
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// The CRD source could not produce a listing
    #[error("failed to list CustomResourceDefinitions: {0}")]
    ListCrds(String),

    /// A refresh did not finish before its deadline
    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema or registry error
    #[error(transparent)]
    Core(#[from] kubedef_core::CoreError),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Whether the failure came from the deadline rather than the source
    pub fn is_timeout(&self) -> bool {
        matches!(self, KubeError::Timeout(_))
    }
}
