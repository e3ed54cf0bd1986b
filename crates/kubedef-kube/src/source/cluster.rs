//! CRDs listed from a live cluster

use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, ListParams};
use kubedef_core::{CrdParser, CrdSchema};
use tracing::debug;

use super::CrdSource;
use crate::error::{KubeError, Result};

/// Lists `CustomResourceDefinition`s through the Kubernetes API
#[derive(Clone)]
pub struct ClusterCrdSource {
    client: kube::Client,
}

impl ClusterCrdSource {
    /// Connect using the default kubeconfig / in-cluster configuration
    pub async fn try_default() -> Result<Self> {
        let client = kube::Client::try_default().await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CrdSource for ClusterCrdSource {
    async fn list_crds(&self) -> Result<Vec<CrdSchema>> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| KubeError::ListCrds(e.to_string()))?;

        debug!(count = list.items.len(), "listed CRDs from cluster");

        list.items
            .iter()
            .map(|crd| -> Result<CrdSchema> {
                let value = serde_json::to_value(crd)?;
                Ok(CrdParser::parse_value(&value)?)
            })
            .collect()
    }

    fn describe(&self) -> String {
        "cluster".to_string()
    }
}
