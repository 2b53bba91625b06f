//! Application state: tracked challenges, the coverage accessor, config, and the selection RNG.
//!
//! Challenges live behind one `RwLock`; evaluation takes the write lock, so no two
//! evaluations ever touch the same challenge at once.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::challenge::Challenge;
use crate::config::{load_config_from_env, ServiceConfig};
use crate::coverage::{ClassDetails, CoverageReportAccessor, JacocoReports};

/// Where a challenge stands from the host's point of view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChallengeStatus {
    Open,
    Completed,
    Rejected { reason: String },
}

#[derive(Clone, Debug)]
pub struct TrackedChallenge {
    pub id: String,
    pub challenge: Challenge,
    pub status: ChallengeStatus,
}

impl TrackedChallenge {
    pub fn is_open(&self) -> bool {
        self.status == ChallengeStatus::Open
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub reports: Arc<dyn CoverageReportAccessor>,
    pub challenges: Arc<RwLock<HashMap<String, TrackedChallenge>>>,
    rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    /// Build state from env: load config, read JaCoCo reports from disk.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_config_from_env().unwrap_or_default();
        info!(
            target: "covquest",
            project = %config.project.name,
            results_path = %config.coverage.results_path.display(),
            csv_path = %config.coverage.csv_path.display(),
            seeded = config.generation.seed.is_some(),
            "Coverage reports configured"
        );
        Self::with_parts(config, Arc::new(JacocoReports))
    }

    pub fn with_parts(config: ServiceConfig, reports: Arc<dyn CoverageReportAccessor>) -> Self {
        let rng = match config.generation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            reports,
            challenges: Arc::new(RwLock::new(HashMap::new())),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn class_details(&self, package_name: &str, class_name: &str) -> ClassDetails {
        self.config.coverage.class_details(package_name, class_name)
    }

    /// Run `f` with the shared selection RNG. Never held across an await.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Track a new challenge as open.
    #[instrument(level = "debug", skip_all, fields(kind = c.type_name()))]
    pub async fn insert_challenge(&self, c: Challenge) -> TrackedChallenge {
        let tracked = TrackedChallenge {
            id: Uuid::new_v4().to_string(),
            challenge: c,
            status: ChallengeStatus::Open,
        };
        self.challenges
            .write()
            .await
            .insert(tracked.id.clone(), tracked.clone());
        tracked
    }

    /// Read-only access to a challenge by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_challenge(&self, id: &str) -> Option<TrackedChallenge> {
        self.challenges.read().await.get(id).cloned()
    }

    /// All tracked challenges, oldest first.
    pub async fn list_challenges(&self) -> Vec<TrackedChallenge> {
        let mut all: Vec<TrackedChallenge> = self.challenges.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            a.challenge
                .created()
                .cmp(&b.challenge.created())
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }
}
