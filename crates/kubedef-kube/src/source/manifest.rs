//! CRDs read from YAML files on disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use kubedef_core::{CrdParser, CrdSchema};
use tracing::debug;

use super::CrdSource;
use crate::error::{KubeError, Result};

/// Reads CRD manifests from files and directories.
///
/// Directories are scanned one level deep for `*.yaml` / `*.yml`; files are
/// read in name order. Multi-document files may mix CRDs with other kinds,
/// which are skipped.
#[derive(Debug, Clone, Default)]
pub struct ManifestCrdSource {
    paths: Vec<PathBuf>,
}

impl ManifestCrdSource {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    async fn manifest_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in &self.paths {
            let metadata = tokio::fs::metadata(path).await.map_err(|e| {
                KubeError::ListCrds(format!("{}: {}", path.display(), e))
            })?;

            if metadata.is_file() {
                files.push(path.clone());
                continue;
            }

            let mut found = Vec::new();
            let mut entries = tokio::fs::read_dir(path).await?;
            while let Some(entry) = entries.next_entry().await? {
                let candidate = entry.path();
                if is_yaml(&candidate) && entry.file_type().await?.is_file() {
                    found.push(candidate);
                }
            }
            found.sort();
            files.extend(found);
        }
        Ok(files)
    }
}

async fn read_crds(file: &Path) -> Result<Vec<CrdSchema>> {
    let content = tokio::fs::read_to_string(file).await?;
    let parsed = CrdParser::parse_all(&content)
        .map_err(|e| KubeError::ListCrds(format!("{}: {}", file.display(), e)))?;
    debug!(file = %file.display(), count = parsed.len(), "read CRD manifests");
    Ok(parsed)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[async_trait]
impl CrdSource for ManifestCrdSource {
    async fn list_crds(&self) -> Result<Vec<CrdSchema>> {
        let files = self.manifest_files().await?;
        let parsed = try_join_all(files.iter().map(|file| read_crds(file))).await?;
        Ok(parsed.into_iter().flatten().collect())
    }

    fn describe(&self) -> String {
        let paths: Vec<String> = self.paths.iter().map(|p| p.display().to_string()).collect();
        format!("manifests [{}]", paths.join(", "))
    }
}
