//! Routing control reconciliation.
//!
//! Drives one side of a [`RoutingControlGroup`] to a desired state, one
//! control at a time in declared order. Controls already in the desired
//! state are skipped, so re-running a reconciliation is safe.
//!
//! A failure stops the loop. Controls switched before the failure keep
//! their new state; nothing is rolled back. The error names the control
//! that failed and the ones already applied, and an operator finishes the
//! cutover by invoking again.

use crate::core::{ControlState, Error, FailoverAction, Result};
use crate::routing::cluster::RecoveryCluster;
use crate::routing::resolver::{GroupSide, RoutingControl, RoutingControlGroup};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// What happened to a single routing control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOutcome {
    pub name: String,
    /// State read before acting
    pub previous: ControlState,
    /// True if an update was issued
    pub updated: bool,
}

/// Result of a completed reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub action: FailoverAction,
    pub desired: ControlState,
    pub side: GroupSide,
    /// Per-control outcomes, in the order processed
    pub controls: Vec<ControlOutcome>,
}

impl ReconcileReport {
    /// Names of the controls that were switched.
    pub fn applied(&self) -> Vec<String> {
        self.controls
            .iter()
            .filter(|c| c.updated)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Names of the controls already in the desired state.
    pub fn skipped(&self) -> Vec<String> {
        self.controls
            .iter()
            .filter(|c| !c.updated)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Number of updates issued.
    pub fn update_count(&self) -> usize {
        self.controls.iter().filter(|c| c.updated).count()
    }
}

/// Drive the side of `group` selected by `action` and `desired`.
///
/// `settle_delay` is slept after every update issued, giving the control
/// plane time to propagate before the next change.
pub async fn reconcile<R: Rng + Send>(
    cluster: &RecoveryCluster<R>,
    group: &RoutingControlGroup,
    action: FailoverAction,
    desired: ControlState,
    settle_delay: Duration,
) -> Result<ReconcileReport> {
    let side = GroupSide::select(action, desired);
    let mut controls = Vec::with_capacity(group.len());

    info!(%action, %desired, %side, count = group.len(), "Reconciling routing controls");

    for control in group.side(side) {
        match reconcile_one(cluster, control, desired, settle_delay).await {
            Ok(outcome) => controls.push(outcome),
            Err(err) => {
                let applied: Vec<String> = controls
                    .iter()
                    .filter(|c| c.updated)
                    .map(|c| c.name.clone())
                    .collect();
                warn!(
                    control = %control.name,
                    applied = applied.len(),
                    error = %err,
                    "Routing control update failed"
                );
                return Err(Error::ReconciliationFailed {
                    control_name: control.name.clone(),
                    source: Box::new(err),
                    applied,
                });
            }
        }
    }

    let report = ReconcileReport {
        action,
        desired,
        side,
        controls,
    };
    info!(updated = report.update_count(), skipped = report.skipped().len(), "Routing controls reconciled");
    Ok(report)
}

async fn reconcile_one<R: Rng + Send>(
    cluster: &RecoveryCluster<R>,
    control: &RoutingControl,
    desired: ControlState,
    settle_delay: Duration,
) -> Result<ControlOutcome> {
    let current = cluster.get_state(&control.arn).await?.into_value();
    if current == desired {
        info!(control = %control.name, state = %current, "No action as desired state matches current state");
        return Ok(ControlOutcome {
            name: control.name.clone(),
            previous: current,
            updated: false,
        });
    }

    info!(control = %control.name, from = %current, to = %desired, "Updating routing control");
    cluster.set_state(&control.arn, desired).await?;
    tokio::time::sleep(settle_delay).await;

    Ok(ControlOutcome {
        name: control.name.clone(),
        previous: current,
        updated: true,
    })
}
