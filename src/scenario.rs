//! Rehearsal scenarios.
//!
//! A scenario file seeds the in-memory collaborators so a cutover can be
//! rehearsed end to end without touching a live deployment.

use crate::config::Settings;
use crate::core::{ControlState, Result};
use crate::invocation::Orchestrator;
use crate::region::{ClusterStatus, GlobalCluster, MemoryDatabase};
use crate::routing::MemoryControlPlane;
use crate::runbook::RunbookConfig;
use crate::store::MemoryConfigStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A routing control seeded into the control plane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedControl {
    pub name: String,
    pub arn: String,
    pub state: ControlState,
}

/// Control-plane seed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneSeed {
    /// Routing controls per control panel
    pub panels: HashMap<String, Vec<SeedControl>>,
    /// Endpoint URLs that refuse every call
    pub down_endpoints: Vec<String>,
    /// Routing control ARNs whose updates are rejected
    pub rejected_updates: Vec<String>,
}

/// Database seed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSeed {
    pub clusters: Vec<GlobalCluster>,
    /// Statuses reported by successive describes, per cluster
    pub status_scripts: HashMap<String, Vec<ClusterStatus>>,
}

/// A rehearsal scenario.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Configuration documents per table
    pub config_store: HashMap<String, Vec<Value>>,
    pub control_plane: ControlPlaneSeed,
    pub database: DatabaseSeed,
    /// Deployment the `cutover` command operates on
    pub runbook: Option<RunbookConfig>,
}

/// Collaborators built from a scenario, kept for inspection after a run.
pub struct Rehearsal {
    pub store: Arc<MemoryConfigStore>,
    pub control_plane: Arc<MemoryControlPlane>,
    pub database: Arc<MemoryDatabase>,
    pub orchestrator: Orchestrator,
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Seed the in-memory collaborators and wire an orchestrator over them.
    pub fn build(&self, settings: Settings) -> Result<Rehearsal> {
        let store = Arc::new(MemoryConfigStore::new());
        for (table, items) in &self.config_store {
            for item in items {
                store.put(table, item.clone())?;
            }
        }

        let control_plane = Arc::new(MemoryControlPlane::new());
        for (panel, controls) in &self.control_plane.panels {
            for control in controls {
                control_plane.add_control(panel, &control.name, &control.arn, control.state);
            }
        }
        for url in &self.control_plane.down_endpoints {
            control_plane.set_endpoint_down(url, true);
        }
        for arn in &self.control_plane.rejected_updates {
            control_plane.reject_updates(arn);
        }

        let database = Arc::new(MemoryDatabase::new());
        for cluster in &self.database.clusters {
            database.insert(cluster.clone());
        }
        for (id, statuses) in &self.database.status_scripts {
            database.script_statuses(id, statuses.clone());
        }

        debug!(
            tables = self.config_store.len(),
            panels = self.control_plane.panels.len(),
            clusters = self.database.clusters.len(),
            "Scenario seeded"
        );

        let orchestrator = Orchestrator::new(
            store.clone(),
            control_plane.clone(),
            database.clone(),
            settings,
        );
        Ok(Rehearsal {
            store,
            control_plane,
            database,
            orchestrator,
        })
    }
}
