//! `rds-failover` handler.

use crate::core::{ErrorKind, FailoverAction, Result};
use crate::invocation::{parse_event, Orchestrator};
use crate::region::{PromotionReport, RegionPair};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Event moving the writer role of a global cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdsFailoverEvent {
    pub primary_region: String,
    pub secondary_region: String,
    /// Global cluster identifier
    pub global_table: String,
    pub action: FailoverAction,
    /// Overrides the configured poll ceiling for this invocation, 0 for none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,
}

impl RdsFailoverEvent {
    pub fn regions(&self) -> RegionPair {
        RegionPair::new(&self.primary_region, &self.secondary_region)
    }
}

/// Result record of the handler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdsFailoverResult {
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionReport>,
}

impl From<Result<PromotionReport>> for RdsFailoverResult {
    fn from(outcome: Result<PromotionReport>) -> Self {
        match outcome {
            Ok(report) => Self {
                error: false,
                promotion: Some(report),
                ..Default::default()
            },
            Err(err) => Self {
                error: true,
                error_kind: Some(err.kind()),
                message: Some(err.to_string()),
                promotion: None,
            },
        }
    }
}

impl Orchestrator {
    /// Move the writer role for `event`.
    pub async fn fail_over_database(&self, event: &RdsFailoverEvent) -> Result<PromotionReport> {
        self.database_controller(event.max_poll_attempts)
            .execute(&event.global_table, &event.regions(), event.action)
            .await
    }

    /// Handle a raw `rds-failover` event.
    pub async fn handle_rds_failover(&self, event: Value) -> RdsFailoverResult {
        let span = info_span!("rds_failover", invocation = %Uuid::new_v4());
        async move {
            let outcome = match parse_event::<RdsFailoverEvent>(event) {
                Ok(event) => {
                    info!(
                        action = %event.action,
                        global_cluster = %event.global_table,
                        primary = %event.primary_region,
                        secondary = %event.secondary_region,
                        "Global cluster failover requested"
                    );
                    self.fail_over_database(&event).await
                }
                Err(err) => Err(err),
            };

            if let Err(err) = &outcome {
                error!(kind = ?err.kind(), error = %err, "Global cluster failover did not complete");
            }
            RdsFailoverResult::from(outcome)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    #[test]
    fn test_event_regions() {
        let event = RdsFailoverEvent {
            primary_region: "us-east-1".to_string(),
            secondary_region: "us-west-2".to_string(),
            global_table: "orders".to_string(),
            action: FailoverAction::FailOver,
            max_poll_attempts: None,
        };
        assert_eq!(event.regions().target(event.action), "us-west-2");
    }

    #[test]
    fn test_error_result() {
        let result = RdsFailoverResult::from(Err(Error::NoWriter("orders".to_string())));
        assert!(result.error);
        assert_eq!(result.error_kind, Some(ErrorKind::PromotionPoll));
        assert!(result.promotion.is_none());
    }
}
