//! Configuration
//!
//! Stored in `~/.config/kubedef/config.yaml`:
//!
//! ```yaml
//! apiVersion: kubedef.io/v1
//! refresh:
//!   timeout: 10s
//!   interval: 5m
//! crdPaths:
//!   - ./crds
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KubeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubedefConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Directories or files holding CRD manifests, for use without a cluster
    #[serde(default)]
    pub crd_paths: Vec<PathBuf>,
}

fn default_api_version() -> String {
    "kubedef.io/v1".to_string()
}

impl Default for KubedefConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            refresh: RefreshConfig::default(),
            crd_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshConfig {
    /// Deadline for one refresh, listing included
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Period of background refreshes; absent disables them
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            interval: None,
        }
    }
}

impl KubedefConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            KubeError::InvalidConfig("could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("kubedef").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.refresh.timeout.is_zero() {
            return Err(KubeError::InvalidConfig(
                "refresh.timeout must be greater than zero".to_string(),
            ));
        }
        if self.refresh.interval.is_some_and(|i| i.is_zero()) {
            return Err(KubeError::InvalidConfig(
                "refresh.interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_absent() {
        let config: KubedefConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, KubedefConfig::default());
        assert_eq!(config.refresh.timeout, Duration::from_secs(10));
        assert!(config.refresh.interval.is_none());
    }

    #[test]
    fn test_humantime_durations() {
        let config: KubedefConfig = serde_yaml::from_str(
            "refresh:\n  timeout: 3s\n  interval: 5m\ncrdPaths: [./crds]\n",
        )
        .unwrap();
        assert_eq!(config.refresh.timeout, Duration::from_secs(3));
        assert_eq!(config.refresh.interval, Some(Duration::from_secs(300)));
        assert_eq!(config.crd_paths, vec![PathBuf::from("./crds")]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = KubedefConfig::default();
        config.refresh.interval = Some(Duration::from_secs(60));
        config.save_to(&path).unwrap();

        assert_eq!(KubedefConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "refresh:\n  timeout: 0s\n").unwrap();

        let err = KubedefConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, KubeError::InvalidConfig(_)));
    }
}
