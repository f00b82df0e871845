//! Cutover runbook.
//!
//! Sequences a full regional cutover: drain the routing controls of the
//! side being left, move the database writer, then enable the side being
//! entered. The first failed stage stops the run.

use crate::core::{now, ControlState, FailoverAction, Timestamp};
use crate::invocation::{
    Orchestrator, RdsFailoverEvent, RdsFailoverResult, RoutingUpdateEvent, RoutingUpdateResult,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Configuration tables of the routing tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTables {
    pub endpoint_table: String,
    pub failover_table: String,
    pub failback_table: String,
    pub arc_cluster: String,
}

/// Global cluster moved by the database stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseTarget {
    pub primary_region: String,
    pub secondary_region: String,
    pub global_table: String,
}

/// What a runbook operates on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunbookConfig {
    pub routing: RoutingTables,
    /// Without a database the promotion stage is skipped
    #[serde(default)]
    pub database: Option<DatabaseTarget>,
}

/// Runbook stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DrainRoutingControls,
    PromoteDatabase,
    EnableRoutingControls,
}

/// Outcome of one stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub error: bool,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingUpdateResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<RdsFailoverResult>,
}

/// Outcome of a cutover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunbookReport {
    pub action: FailoverAction,
    pub error: bool,
    /// Stages that ran, in order
    pub stages: Vec<StageReport>,
}

impl RunbookReport {
    /// The stage that stopped the run, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.stages.iter().find(|s| s.error).map(|s| s.stage)
    }
}

/// Cutover runbook over one deployment.
pub struct Runbook<'a> {
    orchestrator: &'a Orchestrator,
    config: RunbookConfig,
}

impl<'a> Runbook<'a> {
    pub fn new(orchestrator: &'a Orchestrator, config: RunbookConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Run every stage of a cutover for `action`.
    pub async fn cutover(&self, action: FailoverAction) -> RunbookReport {
        let span = info_span!("cutover", runbook = %Uuid::new_v4(), %action);
        async move {
            let mut stages = Vec::with_capacity(3);

            let drain = self.routing_stage(Stage::DrainRoutingControls, action, ControlState::Off).await;
            let failed = drain.error;
            stages.push(drain);

            if !failed {
                if let Some(database) = &self.config.database {
                    let promote = self.database_stage(database, action).await;
                    let failed = promote.error;
                    stages.push(promote);
                    if failed {
                        return finish(action, stages);
                    }
                }
                stages.push(
                    self.routing_stage(Stage::EnableRoutingControls, action, ControlState::On)
                        .await,
                );
            }

            finish(action, stages)
        }
        .instrument(span)
        .await
    }

    async fn routing_stage(&self, stage: Stage, action: FailoverAction, desired: ControlState) -> StageReport {
        let tables = &self.config.routing;
        let event = RoutingUpdateEvent {
            endpoint_table: tables.endpoint_table.clone(),
            failover_table: tables.failover_table.clone(),
            failback_table: tables.failback_table.clone(),
            action,
            arc_cluster: tables.arc_cluster.clone(),
            desired_state: desired,
            settle_delay_secs: None,
        };

        info!(?stage, %desired, "Runbook stage started");
        let started_at = now();
        let result = match self.orchestrator.update_routing_controls(&event).await {
            Ok(report) => RoutingUpdateResult::from(&report),
            Err(err) => RoutingUpdateResult::from(&err),
        };

        StageReport {
            stage,
            error: result.error,
            started_at,
            finished_at: now(),
            routing: Some(result),
            database: None,
        }
    }

    async fn database_stage(&self, target: &DatabaseTarget, action: FailoverAction) -> StageReport {
        let event = RdsFailoverEvent {
            primary_region: target.primary_region.clone(),
            secondary_region: target.secondary_region.clone(),
            global_table: target.global_table.clone(),
            action,
            max_poll_attempts: None,
        };

        info!(stage = ?Stage::PromoteDatabase, global_cluster = %target.global_table, "Runbook stage started");
        let started_at = now();
        let result = RdsFailoverResult::from(self.orchestrator.fail_over_database(&event).await);

        StageReport {
            stage: Stage::PromoteDatabase,
            error: result.error,
            started_at,
            finished_at: now(),
            routing: None,
            database: Some(result),
        }
    }
}

fn finish(action: FailoverAction, stages: Vec<StageReport>) -> RunbookReport {
    let report = RunbookReport {
        action,
        error: stages.iter().any(|s| s.error),
        stages,
    };
    match report.failed_stage() {
        Some(stage) => warn!(?stage, "Cutover stopped"),
        None => info!(stages = report.stages.len(), "Cutover complete"),
    }
    report
}
