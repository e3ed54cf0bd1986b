//! Refresh of the discovered (CRD-backed) registry partition
//!
//! A refresh lists CRDs from its source, translates every served version, builds
//! a brand-new partition and swaps it into the registry in one step. Any failure
//! before the swap leaves the previous partition in place.
//!
//! Refreshes are serialized. A caller that had to wait while another refresh
//! completed gets that refresh's report instead of listing again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kubedef_core::{
    permissive_path, CrdSchema, Gvk, Partition, Registry, SchemaError, Translator,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::error::{KubeError, Result};
use crate::source::CrdSource;

/// A served CRD version that could not be translated
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedVersion {
    /// CRD object name (`<plural>.<group>`)
    pub crd: String,
    pub gvk: Gvk,
    pub error: SchemaError,
}

/// Outcome of one successful refresh
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    /// Monotonic count of successful refreshes, starting at 1
    pub generation: u64,
    /// Number of CRDs listed
    pub crds: usize,
    /// Kinds now present in the discovered partition
    pub registered: Vec<Gvk>,
    pub skipped: Vec<SkippedVersion>,
    pub elapsed: Duration,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Re-derives the discovered partition from a CRD source
pub struct RefreshController {
    registry: Arc<Registry>,
    source: Arc<dyn CrdSource>,
    timeout: Option<Duration>,
    /// Held for the whole of a refresh; stores the latest report
    last: Mutex<Option<Arc<RefreshReport>>>,
    generation: AtomicU64,
}

impl RefreshController {
    pub fn new(registry: Arc<Registry>, source: impl CrdSource + 'static) -> Self {
        Self::with_source(registry, Arc::new(source))
    }

    pub fn with_source(registry: Arc<Registry>, source: Arc<dyn CrdSource>) -> Self {
        Self {
            registry,
            source,
            timeout: None,
            last: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Deadline applied by `spawn_periodic`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Number of successful refreshes so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn last_report(&self) -> Option<Arc<RefreshReport>> {
        self.last.lock().await.clone()
    }

    /// Refresh the discovered partition from the source
    pub async fn refresh(&self) -> Result<Arc<RefreshReport>> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut last = self.last.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(report) = last.as_ref() {
                debug!(
                    generation = report.generation,
                    "refresh completed while waiting, reusing its report"
                );
                return Ok(Arc::clone(report));
            }
        }

        let started = Instant::now();
        let crds = self.source.list_crds().await.map_err(|e| {
            warn!(source = %self.source.describe(), error = %e, "CRD listing failed, keeping previous partition");
            e
        })?;

        let (partition, skipped) = build_partition(&crds, self.registry.builtin());
        let registered: Vec<Gvk> = partition.gvks().cloned().collect();

        // No await between building and publishing
        self.registry.replace_discovered(partition);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let report = Arc::new(RefreshReport {
            generation,
            crds: crds.len(),
            registered,
            skipped,
            elapsed: started.elapsed(),
        });

        info!(
            generation,
            crds = report.crds,
            kinds = report.registered.len(),
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "refreshed discovered packages"
        );

        *last = Some(Arc::clone(&report));
        Ok(report)
    }

    /// Refresh with a deadline covering the whole operation
    pub async fn refresh_with_timeout(&self, deadline: Duration) -> Result<Arc<RefreshReport>> {
        match tokio::time::timeout(deadline, self.refresh()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?deadline, "refresh timed out, keeping previous partition");
                Err(KubeError::Timeout(deadline))
            }
        }
    }

    /// Apply the configured deadline and start background refreshes when an
    /// interval is configured
    pub fn start(self, config: &RefreshConfig) -> Option<JoinHandle<()>> {
        let interval = config.interval?;
        debug!(?interval, timeout = ?config.timeout, "starting periodic refresh");
        Some(Arc::new(self.with_timeout(config.timeout)).spawn_periodic(interval))
    }

    /// Refresh now and then every `interval` until the handle is aborted.
    ///
    /// Failures are logged and the loop continues.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let result = match self.timeout {
                    Some(deadline) => self.refresh_with_timeout(deadline).await,
                    None => self.refresh().await,
                };
                if let Err(e) = result {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        })
    }
}

/// Translate every served version of `crds` into a fresh partition.
///
/// Versions that fail to translate are returned as skipped instead of failing
/// the whole build.
pub fn build_partition(crds: &[CrdSchema], builtin: &Partition) -> (Partition, Vec<SkippedVersion>) {
    let mut partition = Partition::new();
    let mut skipped = Vec::new();

    for crd in crds {
        for version in crd.served_versions() {
            let gvk = crd.gvk(version);
            match Translator::translate_crd(crd, version) {
                Ok(definition) => {
                    let name = definition.name();
                    if builtin.lookup(&permissive_path(&gvk), &name).is_some() {
                        warn!(crd = %crd.name, %gvk, "CRD collides with a built-in kind; the built-in definition wins");
                    }
                    partition.register(definition);
                }
                Err(error) => {
                    warn!(crd = %crd.name, %gvk, %error, "skipping untranslatable CRD version");
                    skipped.push(SkippedVersion {
                        crd: crd.name.clone(),
                        gvk,
                        error,
                    });
                }
            }
        }
    }

    (partition, skipped)
}
