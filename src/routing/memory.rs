//! In-memory control plane.
//!
//! Holds routing control state shared by all endpoints, records every call
//! and can take endpoints down or reject updates for chosen controls.

use crate::core::{ClusterEndpoint, ControlState, Error, Result};
use crate::routing::control_plane::{ControlPlane, RoutingControlSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Operation recorded by [`MemoryControlPlane`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlPlaneOp {
    List { control_panel_arn: String },
    Get { arn: String },
    Update { arn: String, state: ControlState },
}

/// A call as it reached the control plane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneCall {
    /// Endpoint URL the call was sent to
    pub endpoint: String,
    pub op: ControlPlaneOp,
}

#[derive(Default)]
struct Inner {
    panels: HashMap<String, Vec<RoutingControlSummary>>,
    states: HashMap<String, ControlState>,
    down: HashSet<String>,
    rejected_updates: HashSet<String>,
    calls: Vec<ControlPlaneCall>,
}

/// Control plane backed by process memory.
#[derive(Default)]
pub struct MemoryControlPlane {
    inner: Mutex<Inner>,
}

impl MemoryControlPlane {
    /// Create an empty control plane.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a routing control under a control panel.
    pub fn add_control(&self, control_panel_arn: &str, name: &str, arn: &str, state: ControlState) {
        let mut inner = self.lock();
        inner
            .panels
            .entry(control_panel_arn.to_string())
            .or_default()
            .push(RoutingControlSummary::new(name, arn));
        inner.states.insert(arn.to_string(), state);
    }

    /// Take an endpoint down or bring it back.
    pub fn set_endpoint_down(&self, url: &str, down: bool) {
        let mut inner = self.lock();
        if down {
            inner.down.insert(url.to_string());
        } else {
            inner.down.remove(url);
        }
    }

    /// Reject every update of a routing control on every endpoint.
    pub fn reject_updates(&self, arn: &str) {
        self.lock().rejected_updates.insert(arn.to_string());
    }

    /// Accept updates of a routing control again.
    pub fn accept_updates(&self, arn: &str) {
        self.lock().rejected_updates.remove(arn);
    }

    /// Current state of a routing control.
    pub fn state(&self, arn: &str) -> Option<ControlState> {
        self.lock().states.get(arn).copied()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ControlPlaneCall> {
        self.lock().calls.clone()
    }

    /// Number of update calls received, accepted or not.
    pub fn update_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c.op, ControlPlaneOp::Update { .. }))
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Record the call and fail if the endpoint is down.
    fn admit(&self, endpoint: &ClusterEndpoint, op: ControlPlaneOp) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.calls.push(ControlPlaneCall {
            endpoint: endpoint.url.clone(),
            op,
        });
        if inner.down.contains(&endpoint.url) {
            return Err(Error::EndpointUnavailable {
                endpoint: endpoint.url.clone(),
                message: "connection refused".to_string(),
            });
        }
        Ok(inner)
    }
}

#[async_trait]
impl ControlPlane for MemoryControlPlane {
    async fn list_routing_controls(
        &self,
        endpoint: &ClusterEndpoint,
        control_panel_arn: &str,
    ) -> Result<Vec<RoutingControlSummary>> {
        let inner = self.admit(
            endpoint,
            ControlPlaneOp::List {
                control_panel_arn: control_panel_arn.to_string(),
            },
        )?;
        inner
            .panels
            .get(control_panel_arn)
            .cloned()
            .ok_or_else(|| Error::ControlPlane(format!("control panel {control_panel_arn} not found")))
    }

    async fn get_routing_control_state(
        &self,
        endpoint: &ClusterEndpoint,
        routing_control_arn: &str,
    ) -> Result<ControlState> {
        let inner = self.admit(
            endpoint,
            ControlPlaneOp::Get {
                arn: routing_control_arn.to_string(),
            },
        )?;
        inner
            .states
            .get(routing_control_arn)
            .copied()
            .ok_or_else(|| Error::ControlPlane(format!("routing control {routing_control_arn} not found")))
    }

    async fn update_routing_control_state(
        &self,
        endpoint: &ClusterEndpoint,
        routing_control_arn: &str,
        state: ControlState,
    ) -> Result<()> {
        let mut inner = self.admit(
            endpoint,
            ControlPlaneOp::Update {
                arn: routing_control_arn.to_string(),
                state,
            },
        )?;
        if inner.rejected_updates.contains(routing_control_arn) {
            return Err(Error::ControlPlane(format!(
                "update of {routing_control_arn} rejected"
            )));
        }
        match inner.states.get_mut(routing_control_arn) {
            Some(current) => {
                *current = state;
                Ok(())
            }
            None => Err(Error::ControlPlane(format!(
                "routing control {routing_control_arn} not found"
            ))),
        }
    }
}
