//! Database failover controller.
//!
//! Moves the writer role of a global cluster to the region an action
//! targets, then polls until the cluster reports available again.

use crate::core::{Error, FailoverAction, Result};
use crate::region::cluster::{DatabaseService, RegionPair};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Progress of one promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionState {
    NotStarted,
    PromotionRequested,
    Polling,
    /// Cluster available with the writer in the target region
    Converged,
    Failed,
}

impl std::fmt::Display for PromotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PromotionState::NotStarted => "not_started",
            PromotionState::PromotionRequested => "promotion_requested",
            PromotionState::Polling => "polling",
            PromotionState::Converged => "converged",
            PromotionState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// How long to wait for a promotion to converge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between polls
    pub interval: Duration,
    /// Poll ceiling, `None` for no ceiling
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: Some(120),
        }
    }
}

/// Outcome of a successful promotion run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionReport {
    pub global_cluster: String,
    pub action: FailoverAction,
    pub target_region: String,
    /// Member promoted, None when the writer was already in place
    pub promoted_member: Option<String>,
    /// Status polls issued after the promotion
    pub polls: u32,
    /// States visited, in order
    pub history: Vec<PromotionState>,
}

impl PromotionReport {
    /// True if no promotion was needed.
    pub fn already_in_place(&self) -> bool {
        self.promoted_member.is_none()
    }
}

/// Database failover controller.
pub struct DatabaseFailoverController {
    database: Arc<dyn DatabaseService>,
    policy: PollPolicy,
}

impl DatabaseFailoverController {
    /// Create a new controller.
    pub fn new(database: Arc<dyn DatabaseService>, policy: PollPolicy) -> Self {
        Self { database, policy }
    }

    /// Move the writer role of `global_cluster` for `action`.
    pub async fn execute(
        &self,
        global_cluster: &str,
        regions: &RegionPair,
        action: FailoverAction,
    ) -> Result<PromotionReport> {
        let mut history = vec![PromotionState::NotStarted];
        let result = self.drive(global_cluster, regions, action, &mut history).await;

        if let Err(err) = &result {
            let reached = history.last().copied().unwrap_or(PromotionState::NotStarted);
            error!(
                global_cluster,
                %action,
                reached = %reached,
                state = %PromotionState::Failed,
                error = %err,
                "Global cluster failover failed"
            );
        }
        result
    }

    async fn drive(
        &self,
        global_cluster: &str,
        regions: &RegionPair,
        action: FailoverAction,
        history: &mut Vec<PromotionState>,
    ) -> Result<PromotionReport> {
        let target_region = regions.target(action);
        let cluster = self.database.describe_global_cluster(global_cluster).await?;

        let writer = cluster
            .writer()
            .ok_or_else(|| Error::NoWriter(global_cluster.to_string()))?;
        info!(global_cluster, writer = %writer.arn, region = %writer.region, "Current writer member");

        if writer.region == target_region {
            info!(global_cluster, region = target_region, "Cluster is already writer in target region");
            advance(history, PromotionState::Converged);
            return Ok(PromotionReport {
                global_cluster: global_cluster.to_string(),
                action,
                target_region: target_region.to_string(),
                promoted_member: None,
                polls: 0,
                history: history.clone(),
            });
        }

        let target = cluster
            .reader_in(target_region)
            .ok_or_else(|| Error::NoReaderInRegion {
                cluster: global_cluster.to_string(),
                region: target_region.to_string(),
            })?
            .arn
            .clone();

        info!(global_cluster, target = %target, "Requesting global cluster failover");
        self.database
            .failover_global_cluster(global_cluster, &target)
            .await?;
        advance(history, PromotionState::PromotionRequested);

        advance(history, PromotionState::Polling);
        let polls = self.wait_available(global_cluster).await?;
        advance(history, PromotionState::Converged);

        info!(global_cluster, target = %target, polls, "Global cluster failover converged");
        Ok(PromotionReport {
            global_cluster: global_cluster.to_string(),
            action,
            target_region: target_region.to_string(),
            promoted_member: Some(target),
            polls,
            history: history.clone(),
        })
    }

    /// Poll until available; returns the number of polls issued.
    async fn wait_available(&self, global_cluster: &str) -> Result<u32> {
        let mut polls = 0u32;
        loop {
            polls += 1;
            let cluster = self.database.describe_global_cluster(global_cluster).await?;
            info!(global_cluster, poll = polls, status = %cluster.status, "Checking for global cluster to become available");

            if cluster.status.is_available() {
                return Ok(polls);
            }
            if let Some(max) = self.policy.max_attempts {
                if polls >= max {
                    return Err(Error::PromotionTimedOut {
                        cluster: global_cluster.to_string(),
                        attempts: polls,
                    });
                }
            }
            tokio::time::sleep(self.policy.interval).await;
        }
    }
}

fn advance(history: &mut Vec<PromotionState>, next: PromotionState) {
    debug!(state = %next, "Promotion state");
    history.push(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::region::cluster::{ClusterMember, ClusterStatus, GlobalCluster};
    use crate::region::memory::MemoryDatabase;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(30);

    fn database() -> Arc<MemoryDatabase> {
        let db = Arc::new(MemoryDatabase::new());
        db.insert(GlobalCluster {
            id: "orders".to_string(),
            members: vec![
                ClusterMember::writer("arn:rds:us-east-1:cluster:orders-east", "us-east-1"),
                ClusterMember::reader("arn:rds:us-west-2:cluster:orders-west", "us-west-2"),
            ],
            status: ClusterStatus::Available,
        });
        db
    }

    fn regions() -> RegionPair {
        RegionPair::new("us-east-1", "us-west-2")
    }

    fn controller(db: &Arc<MemoryDatabase>, max_attempts: Option<u32>) -> DatabaseFailoverController {
        DatabaseFailoverController::new(
            db.clone(),
            PollPolicy {
                interval: INTERVAL,
                max_attempts,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_circuit_when_writer_in_place() {
        let db = database();
        let report = controller(&db, Some(5))
            .execute("orders", &regions(), FailoverAction::FailBack)
            .await
            .unwrap();

        assert!(report.already_in_place());
        assert!(db.failover_calls().is_empty());
        assert_eq!(
            report.history,
            vec![PromotionState::NotStarted, PromotionState::Converged]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_available() {
        let db = database();
        db.script_statuses(
            "orders",
            vec![
                ClusterStatus::Available,
                ClusterStatus::Modifying,
                ClusterStatus::Modifying,
                ClusterStatus::Available,
            ],
        );

        let started = Instant::now();
        let report = controller(&db, None)
            .execute("orders", &regions(), FailoverAction::FailOver)
            .await
            .unwrap();

        assert_eq!(report.polls, 3);
        // one describe for topology, three polls
        assert_eq!(db.describe_calls(), 4);
        assert_eq!(started.elapsed(), INTERVAL * 2);
        assert_eq!(
            report.promoted_member.as_deref(),
            Some("arn:rds:us-west-2:cluster:orders-west")
        );
        assert_eq!(
            db.failover_calls(),
            vec![(
                "orders".to_string(),
                "arn:rds:us-west-2:cluster:orders-west".to_string()
            )]
        );
        assert_eq!(report.history.last(), Some(&PromotionState::Converged));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ceiling() {
        let db = database();
        db.script_statuses(
            "orders",
            vec![ClusterStatus::Available, ClusterStatus::FailingOver, ClusterStatus::FailingOver, ClusterStatus::FailingOver],
        );

        let err = controller(&db, Some(2))
            .execute("orders", &regions(), FailoverAction::FailOver)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PromotionTimedOut { attempts: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::PromotionPoll);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_fails() {
        let db = database();
        db.script_statuses("orders", vec![ClusterStatus::Available, ClusterStatus::Modifying]);
        db.fail_describe_after(2);

        let err = controller(&db, None)
            .execute("orders", &regions(), FailoverAction::FailOver)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Database(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_reader_in_target_region() {
        let db = Arc::new(MemoryDatabase::new());
        db.insert(GlobalCluster {
            id: "orders".to_string(),
            members: vec![
                ClusterMember::writer("arn:east", "us-east-1"),
                ClusterMember::reader("arn:eu", "eu-west-1"),
            ],
            status: ClusterStatus::Available,
        });

        let err = controller(&db, None)
            .execute("orders", &regions(), FailoverAction::FailOver)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoReaderInRegion { .. }));
        assert!(db.failover_calls().is_empty());
    }
}
