//! Invocation boundary.
//!
//! Accepts the JSON events of the two handlers, runs the matching
//! workflow and collapses the outcome into a result record whose `error`
//! flag is what callers branch on. The remaining fields are diagnostic.

pub mod rds;
pub mod routing;

pub use rds::{RdsFailoverEvent, RdsFailoverResult};
pub use routing::{RoutingUpdateEvent, RoutingUpdateResult};

use crate::config::Settings;
use crate::core::{ClusterEndpoint, Error, Result};
use crate::region::{DatabaseFailoverController, DatabaseService};
use crate::routing::{ControlPlane, EndpointSelector, RecoveryCluster};
use crate::store::ConfigStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Entry point wiring the collaborators of one deployment together.
pub struct Orchestrator {
    store: Arc<dyn ConfigStore>,
    control_plane: Arc<dyn ControlPlane>,
    database: Arc<dyn DatabaseService>,
    settings: Settings,
    endpoint_seed: Option<u64>,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        control_plane: Arc<dyn ControlPlane>,
        database: Arc<dyn DatabaseService>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            control_plane,
            database,
            settings,
            endpoint_seed: None,
        }
    }

    /// Draw endpoint trial orders from a fixed seed.
    pub fn with_endpoint_seed(mut self, seed: u64) -> Self {
        self.endpoint_seed = Some(seed);
        self
    }

    fn recovery_cluster(&self, endpoints: Vec<ClusterEndpoint>) -> Result<RecoveryCluster> {
        let selector = match self.endpoint_seed {
            Some(seed) => EndpointSelector::seeded(endpoints, seed)?,
            None => EndpointSelector::new(endpoints)?,
        };
        Ok(RecoveryCluster::new(self.control_plane.clone(), selector))
    }

    /// An override of 0 lifts the ceiling, as `DR_DB_POLL_MAX_ATTEMPTS=0` does.
    fn database_controller(&self, max_attempts: Option<u32>) -> DatabaseFailoverController {
        let mut policy = self.settings.poll_policy();
        if let Some(max) = max_attempts {
            policy.max_attempts = (max > 0).then_some(max);
        }
        DatabaseFailoverController::new(self.database.clone(), policy)
    }
}

/// Decode an invocation event.
///
/// Missing fields are reported as such; other decode failures as invalid
/// input.
pub fn parse_event<T: DeserializeOwned>(event: Value) -> Result<T> {
    serde_json::from_value(event).map_err(|err| {
        let message = err.to_string();
        if message.starts_with("missing field") {
            Error::MissingField(message)
        } else {
            Error::InvalidInput(message)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_event_missing_field() {
        let err = parse_event::<RdsFailoverEvent>(json!({
            "primary_region": "us-east-1",
            "secondary_region": "us-west-2",
            "action": "fail_over"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MissingField(ref m) if m.contains("global_table")));
    }

    #[test]
    fn test_parse_event_bad_action() {
        let err = parse_event::<RdsFailoverEvent>(json!({
            "primary_region": "us-east-1",
            "secondary_region": "us-west-2",
            "global_table": "orders",
            "action": "sideways"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
