//! Mock CRD source for testing
//!
//! Holds CRDs in memory, useful for unit tests without requiring a
//! Kubernetes cluster. Failures and latency can be injected.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use kubedef_core::CrdSchema;

use super::CrdSource;
use crate::error::{KubeError, Result};

/// In-memory CRD source for testing
#[derive(Clone, Default)]
pub struct MockCrdSource {
    state: Arc<RwLock<MockState>>,
}

#[derive(Default)]
struct MockState {
    crds: Vec<CrdSchema>,
    failure: Option<String>,
    delay: Option<Duration>,
    counts: SourceCounts,
}

/// Counts of listings performed, for assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceCounts {
    pub lists: usize,
    pub failures: usize,
}

impl MockCrdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-installed CRDs
    pub fn with_crds(crds: Vec<CrdSchema>) -> Self {
        let source = Self::new();
        source.write(|state| state.crds = crds);
        source
    }

    /// Install a CRD, replacing any with the same name
    pub fn install(&self, crd: CrdSchema) {
        self.write(|state| {
            state.crds.retain(|c| c.name != crd.name);
            state.crds.push(crd);
        });
    }

    /// Remove a CRD by name; returns whether it was present
    pub fn uninstall(&self, name: &str) -> bool {
        self.write(|state| {
            let before = state.crds.len();
            state.crds.retain(|c| c.name != name);
            before != state.crds.len()
        })
    }

    /// Make every subsequent listing fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        let message = message.into();
        self.write(|state| state.failure = Some(message));
    }

    pub fn recover(&self) {
        self.write(|state| state.failure = None);
    }

    /// Delay every listing, to exercise deadlines and contention
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.write(|state| state.delay = delay);
    }

    pub fn counts(&self) -> SourceCounts {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .counts
            .clone()
    }

    fn write<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

#[async_trait]
impl CrdSource for MockCrdSource {
    async fn list_crds(&self) -> Result<Vec<CrdSchema>> {
        let delay = self.write(|state| {
            state.counts.lists += 1;
            state.delay
        });

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.write(|state| match &state.failure {
            Some(message) => {
                state.counts.failures += 1;
                Err(KubeError::ListCrds(message.clone()))
            }
            None => Ok(state.crds.clone()),
        })
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubedef_core::CrdParser;

    fn crd(name: &str, group: &str, kind: &str) -> CrdSchema {
        CrdParser::parse(&format!(
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: {name}
spec:
  group: {group}
  names:
    kind: {kind}
    plural: things
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_install_and_uninstall() {
        let source = MockCrdSource::new();
        assert!(source.list_crds().await.unwrap().is_empty());

        source.install(crd("foos.example.com", "example.com", "Foo"));
        source.install(crd("foos.example.com", "example.com", "Foo"));
        assert_eq!(source.list_crds().await.unwrap().len(), 1);

        assert!(source.uninstall("foos.example.com"));
        assert!(!source.uninstall("foos.example.com"));
        assert!(source.list_crds().await.unwrap().is_empty());
        assert_eq!(source.counts().lists, 3);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let source = MockCrdSource::with_crds(vec![crd("foos.example.com", "example.com", "Foo")]);
        source.fail_with("connection refused");

        let err = source.list_crds().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));

        source.recover();
        assert_eq!(source.list_crds().await.unwrap().len(), 1);
        assert_eq!(
            source.counts(),
            SourceCounts {
                lists: 2,
                failures: 1
            }
        );
    }
}
