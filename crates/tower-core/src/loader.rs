//! Building asset loading
//!
//! The environment model is loaded first, then every floor's structure and
//! plan models concurrently. A failed model is logged and its slot stays
//! empty; the registry becomes ready once every load has settled.

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::floor::Floor;
use crate::layout::PlacementLayout;
use crate::registry::{AssetRegistry, ModelSlot};
use crate::scene::ModelTree;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
}

/// Produces model trees from asset paths
pub trait ModelSource: Sync {
    fn load<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ModelTree, LoadError>>;
}

/// Settled loads out of the expected total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadProgress {
    pub settled: usize,
    pub total: usize,
    pub failed: usize,
}

impl LoadProgress {
    /// Whole percent of settled loads; an empty load is complete
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let ratio = self.settled.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.settled >= self.total
    }
}

/// What the loading overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingState {
    pub loading: bool,
    pub percent: u8,
}

impl From<LoadProgress> for LoadingState {
    fn from(progress: LoadProgress) -> Self {
        Self {
            loading: !progress.is_complete(),
            percent: progress.percent(),
        }
    }
}

/// Counts settled loads for pipelines that attach models one at a time
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    progress: LoadProgress,
}

impl LoadTracker {
    /// Total for a building: the environment plus every floor asset path
    pub fn for_building(floors: &[Floor]) -> Self {
        let total = 1 + floors.iter().map(Floor::asset_count).sum::<usize>();
        Self {
            progress: LoadProgress {
                total,
                ..Default::default()
            },
        }
    }

    pub fn settle(&mut self, success: bool) -> LoadProgress {
        self.progress.settled += 1;
        if !success {
            self.progress.failed += 1;
        }
        self.progress
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }
}

/// A model that could not be loaded or attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub slot: ModelSlot,
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<ModelSlot>,
    pub failures: Vec<LoadFailure>,
}

pub struct BuildingLoader<S> {
    source: S,
    layout: PlacementLayout,
}

impl<S: ModelSource> BuildingLoader<S> {
    pub fn new(source: S, layout: PlacementLayout) -> Self {
        Self { source, layout }
    }

    /// Load every model of the building into a fresh registry.
    ///
    /// `on_progress` is called after each load settles, success or not.
    pub async fn load<F>(
        &self,
        environment: &str,
        floors: &[Floor],
        mut on_progress: F,
    ) -> (AssetRegistry, LoadReport)
    where
        F: FnMut(LoadProgress),
    {
        let mut registry = AssetRegistry::new(self.layout.clone());
        let mut report = LoadReport::default();
        let mut tracker = LoadTracker::for_building(floors);
        info!(
            floors = floors.len(),
            models = tracker.progress().total,
            "Loading building"
        );

        let result = self.source.load(environment).await;
        let ok = Self::settle(&mut registry, &mut report, ModelSlot::Environment, environment, result);
        on_progress(tracker.settle(ok));

        let mut pending: FuturesUnordered<_> = floors
            .iter()
            .flat_map(|floor| floor.asset_slots())
            .map(|(slot, path)| async move { (slot, path, self.source.load(path).await) })
            .collect();

        while let Some((slot, path, result)) = pending.next().await {
            let ok = Self::settle(&mut registry, &mut report, slot, path, result);
            on_progress(tracker.settle(ok));
        }

        registry.mark_ready();
        info!(
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "Building load settled"
        );
        (registry, report)
    }

    fn settle(
        registry: &mut AssetRegistry,
        report: &mut LoadReport,
        slot: ModelSlot,
        path: &str,
        result: Result<ModelTree, LoadError>,
    ) -> bool {
        let error = match result {
            Ok(tree) => match registry.attach(slot, tree) {
                Ok(_) => {
                    report.loaded.push(slot);
                    return true;
                }
                Err(e) => {
                    warn!(slot = %slot, path, "Model not attached: {}", e);
                    e.to_string()
                }
            },
            Err(e) => {
                error!(slot = %slot, path, "Failed to load model: {}", e);
                e.to_string()
            }
        };
        report.failures.push(LoadFailure {
            slot,
            path: path.to_string(),
            error,
        });
        false
    }
}
