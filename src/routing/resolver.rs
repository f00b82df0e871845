//! Resolve declared routing-control names to backend identifiers.

use crate::core::{ControlState, Error, FailoverAction, Result};
use crate::routing::cluster::RecoveryCluster;
use crate::routing::control_plane::RoutingControlSummary;
use crate::store::DeclaredControls;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A routing control with its backend identifier resolved.
///
/// Only valid for the operation that resolved it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingControl {
    pub name: String,
    pub arn: String,
}

impl From<&RoutingControlSummary> for RoutingControl {
    fn from(summary: &RoutingControlSummary) -> Self {
        Self {
            name: summary.name.clone(),
            arn: summary.arn.clone(),
        }
    }
}

/// Which half of a group a cutover step operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSide {
    Primary,
    Secondary,
}

impl GroupSide {
    /// Side driven by `action` toward `desired`.
    ///
    /// Failing over turns the primary side off and the secondary side on;
    /// failing back does the reverse.
    pub fn select(action: FailoverAction, desired: ControlState) -> Self {
        match (action, desired) {
            (FailoverAction::FailOver, ControlState::Off) => GroupSide::Primary,
            (FailoverAction::FailOver, ControlState::On) => GroupSide::Secondary,
            (FailoverAction::FailBack, ControlState::Off) => GroupSide::Secondary,
            (FailoverAction::FailBack, ControlState::On) => GroupSide::Primary,
        }
    }
}

impl std::fmt::Display for GroupSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupSide::Primary => write!(f, "primary"),
            GroupSide::Secondary => write!(f, "secondary"),
        }
    }
}

/// Primary and secondary routing controls, corresponding 1:1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoutingControlGroup {
    primary: Vec<RoutingControl>,
    secondary: Vec<RoutingControl>,
}

impl RoutingControlGroup {
    /// Build a group, rejecting unequal halves.
    pub fn new(primary: Vec<RoutingControl>, secondary: Vec<RoutingControl>) -> Result<Self> {
        if primary.len() != secondary.len() {
            return Err(Error::RoutingControlMismatch {
                primary: primary.len(),
                secondary: secondary.len(),
            });
        }
        Ok(Self { primary, secondary })
    }

    pub fn primary(&self) -> &[RoutingControl] {
        &self.primary
    }

    pub fn secondary(&self) -> &[RoutingControl] {
        &self.secondary
    }

    /// Controls on one side, in declared order.
    pub fn side(&self, side: GroupSide) -> &[RoutingControl] {
        match side {
            GroupSide::Primary => &self.primary,
            GroupSide::Secondary => &self.secondary,
        }
    }

    /// Number of control pairs.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

/// Match declared names against the live control list.
///
/// Declared order is preserved and a duplicate live name resolves to its
/// first occurrence. Any declared name missing from the live list fails the
/// whole match, as does a group with nothing declared.
pub fn match_declared(
    declared: &DeclaredControls,
    live: &[RoutingControlSummary],
) -> Result<RoutingControlGroup> {
    let mut unresolved = Vec::new();
    let mut pick = |names: &[String]| -> Vec<RoutingControl> {
        names
            .iter()
            .filter_map(|name| match live.iter().find(|rc| &rc.name == name) {
                Some(found) => Some(RoutingControl::from(found)),
                None => {
                    warn!(control = %name, "Declared routing control not found on control panel");
                    unresolved.push(name.clone());
                    None
                }
            })
            .collect()
    };

    let primary = pick(&declared.primary);
    let secondary = pick(&declared.secondary);
    if !unresolved.is_empty() {
        return Err(Error::UnresolvedRoutingControls { names: unresolved });
    }

    let group = RoutingControlGroup::new(primary, secondary)?;
    if group.is_empty() {
        return Err(Error::EmptyRoutingControlGroup);
    }
    Ok(group)
}

/// Resolve the declared controls of a control panel through the live cluster.
pub async fn resolve<R: Rng + Send>(
    cluster: &RecoveryCluster<R>,
    control_panel_arn: &str,
    declared: &DeclaredControls,
) -> Result<RoutingControlGroup> {
    let listed = cluster.list_routing_controls(control_panel_arn).await?;
    let group = match_declared(declared, &listed.value)?;

    info!(
        control_panel = control_panel_arn,
        pairs = group.len(),
        endpoint = %listed.endpoint.url,
        "Resolved routing controls"
    );
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClusterEndpoint;
    use crate::routing::memory::MemoryControlPlane;
    use crate::routing::selector::EndpointSelector;
    use std::sync::Arc;

    fn live() -> Vec<RoutingControlSummary> {
        vec![
            RoutingControlSummary::new("east-a", "arn:east-a"),
            RoutingControlSummary::new("east-b", "arn:east-b"),
            RoutingControlSummary::new("west-a", "arn:west-a"),
            RoutingControlSummary::new("west-b", "arn:west-b"),
            RoutingControlSummary::new("east-c", "arn:east-c"),
            RoutingControlSummary::new("east-a", "arn:east-a-dup"),
        ]
    }

    fn declared(primary: &[&str], secondary: &[&str]) -> DeclaredControls {
        DeclaredControls {
            primary: primary.iter().map(|s| s.to_string()).collect(),
            secondary: secondary.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_side_selection_table() {
        use ControlState::*;
        use FailoverAction::*;
        assert_eq!(GroupSide::select(FailOver, Off), GroupSide::Primary);
        assert_eq!(GroupSide::select(FailOver, On), GroupSide::Secondary);
        assert_eq!(GroupSide::select(FailBack, Off), GroupSide::Secondary);
        assert_eq!(GroupSide::select(FailBack, On), GroupSide::Primary);
    }

    #[test]
    fn test_match_preserves_declared_order() {
        let group =
            match_declared(&declared(&["east-b", "east-a"], &["west-b", "west-a"]), &live())
                .unwrap();
        let names: Vec<_> = group.primary().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["east-b", "east-a"]);
        assert_eq!(group.primary()[1].arn, "arn:east-a");
        assert_eq!(group.side(GroupSide::Secondary)[0].arn, "arn:west-b");
    }

    #[test]
    fn test_unequal_groups_rejected() {
        let err = match_declared(
            &declared(&["east-a", "east-b", "east-c"], &["west-a", "west-b"]),
            &live(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::RoutingControlMismatch {
                primary: 3,
                secondary: 2
            }
        ));
    }

    #[test]
    fn test_unknown_names_rejected_even_when_sizes_match() {
        let err = match_declared(
            &declared(&["east-a", "east-typo"], &["west-typo", "west-b"]),
            &live(),
        )
        .unwrap_err();
        match &err {
            Error::UnresolvedRoutingControls { names } => {
                assert_eq!(names, &vec!["east-typo".to_string(), "west-typo".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), crate::core::ErrorKind::Configuration);
    }

    #[test]
    fn test_empty_declaration_rejected() {
        let err = match_declared(&declared(&[], &[]), &live()).unwrap_err();
        assert!(matches!(err, Error::EmptyRoutingControlGroup));
    }

    #[tokio::test]
    async fn test_resolve_against_cluster() {
        let plane = Arc::new(MemoryControlPlane::new());
        for rc in live().iter().take(5) {
            plane.add_control("arn:panel", &rc.name, &rc.arn, ControlState::On);
        }
        let selector =
            EndpointSelector::seeded(vec![ClusterEndpoint::new("https://a.example", "us-east-1")], 9)
                .unwrap();
        let cluster = RecoveryCluster::new(plane, selector);

        let group = resolve(&cluster, "arn:panel", &declared(&["east-a"], &["west-a"]))
            .await
            .unwrap();

        assert_eq!(group.len(), 1);
        assert_eq!(group.secondary()[0].arn, "arn:west-a");
    }
}
