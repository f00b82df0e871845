//! `routing-control-update` handler.

use crate::core::{ControlState, Error, ErrorKind, FailoverAction, FailoverRequest, Result};
use crate::invocation::{parse_event, Orchestrator};
use crate::routing::{reconcile, resolve, GroupSide, ReconcileReport};
use crate::store::{fetch_endpoints, fetch_routing_controls};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Event driving one side of the routing controls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingUpdateEvent {
    /// Table holding cluster endpoints
    pub endpoint_table: String,
    /// Table holding the routing controls used when failing over
    pub failover_table: String,
    /// Table holding the routing controls used when failing back
    pub failback_table: String,
    pub action: FailoverAction,
    /// Recovery cluster name, the partition key of all three tables
    pub arc_cluster: String,
    pub desired_state: ControlState,
    /// Overrides the configured settle delay for this invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_secs: Option<u64>,
}

impl RoutingUpdateEvent {
    /// Table whose routing-control map applies to this action.
    pub fn routing_table(&self) -> &str {
        match self.action {
            FailoverAction::FailOver => &self.failover_table,
            FailoverAction::FailBack => &self.failback_table,
        }
    }

    /// The routing work this event asks for.
    pub fn request(&self) -> FailoverRequest {
        FailoverRequest {
            action: self.action,
            desired_state: self.desired_state,
            cluster_id: self.arc_cluster.clone(),
        }
    }
}

/// Result record of the handler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingUpdateResult {
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<GroupSide>,
    /// Controls switched by this invocation
    #[serde(default)]
    pub applied: Vec<String>,
    /// Controls already in the desired state
    #[serde(default)]
    pub skipped: Vec<String>,
    /// Control whose update failed; later controls were not touched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_control: Option<String>,
}

impl From<&ReconcileReport> for RoutingUpdateResult {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            error: false,
            side: Some(report.side),
            applied: report.applied(),
            skipped: report.skipped(),
            ..Default::default()
        }
    }
}

impl From<&Error> for RoutingUpdateResult {
    fn from(err: &Error) -> Self {
        let mut result = Self {
            error: true,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
            ..Default::default()
        };
        if let Error::ReconciliationFailed {
            control_name,
            applied,
            ..
        } = err
        {
            result.failed_control = Some(control_name.clone());
            result.applied = applied.clone();
        }
        result
    }
}

impl Orchestrator {
    /// Resolve the routing controls for `event` and reconcile them.
    pub async fn update_routing_controls(&self, event: &RoutingUpdateEvent) -> Result<ReconcileReport> {
        let request = event.request();
        let store = self.store.as_ref();
        let endpoints = fetch_endpoints(store, &event.endpoint_table, &request.cluster_id).await?;
        let record = fetch_routing_controls(store, event.routing_table(), &request.cluster_id).await?;

        let cluster = self.recovery_cluster(endpoints)?;
        let group = resolve(&cluster, &record.control_panel_arn, &record.routing_controls).await?;

        let settle_delay = event
            .settle_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(self.settings.settle_delay);
        reconcile(&cluster, &group, request.action, request.desired_state, settle_delay).await
    }

    /// Handle a raw `routing-control-update` event.
    pub async fn handle_routing_update(&self, event: Value) -> RoutingUpdateResult {
        let span = info_span!("routing_control_update", invocation = %Uuid::new_v4());
        async move {
            let outcome = match parse_event::<RoutingUpdateEvent>(event) {
                Ok(event) => {
                    info!(
                        action = %event.action,
                        desired = %event.desired_state,
                        arc_cluster = %event.arc_cluster,
                        "Routing control update requested"
                    );
                    self.update_routing_controls(&event).await
                }
                Err(err) => Err(err),
            };

            match outcome {
                Ok(report) => RoutingUpdateResult::from(&report),
                Err(err) => {
                    error!(kind = ?err.kind(), error = %err, "Could not update the routing control to desired state");
                    RoutingUpdateResult::from(&err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_table_follows_action() {
        let mut event = RoutingUpdateEvent {
            endpoint_table: "endpoints".to_string(),
            failover_table: "failover".to_string(),
            failback_table: "failback".to_string(),
            action: FailoverAction::FailOver,
            arc_cluster: "dr".to_string(),
            desired_state: ControlState::Off,
            settle_delay_secs: None,
        };
        assert_eq!(event.routing_table(), "failover");
        assert_eq!(event.request().cluster_id, "dr");
        event.action = FailoverAction::FailBack;
        assert_eq!(event.routing_table(), "failback");
    }

    #[test]
    fn test_failure_result_lists_applied() {
        let err = Error::ReconciliationFailed {
            control_name: "west-b".to_string(),
            source: Box::new(Error::ControlPlane("rejected".to_string())),
            applied: vec!["west-a".to_string()],
        };
        let result = RoutingUpdateResult::from(&err);
        assert!(result.error);
        assert_eq!(result.error_kind, Some(ErrorKind::Reconciliation));
        assert_eq!(result.failed_control.as_deref(), Some("west-b"));
        assert_eq!(result.applied, vec!["west-a".to_string()]);
    }

    #[test]
    fn test_success_result_serializes_error_false() {
        let json = serde_json::to_value(RoutingUpdateResult::default()).unwrap();
        assert_eq!(json["error"], false);
        assert!(json.get("message").is_none());
    }
}
