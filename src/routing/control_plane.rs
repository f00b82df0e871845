//! Control-plane service contract.
//!
//! Every call names the endpoint it is sent to; the caller decides which
//! redundant endpoint answers.

use crate::core::{ClusterEndpoint, ControlState, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A routing control as listed by the control plane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingControlSummary {
    /// Logical name, stable across environments
    pub name: String,
    /// Backend identifier
    pub arn: String,
}

impl RoutingControlSummary {
    pub fn new(name: &str, arn: &str) -> Self {
        Self {
            name: name.to_string(),
            arn: arn.to_string(),
        }
    }
}

/// Remote routing-control service.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// List every routing control of a control panel.
    async fn list_routing_controls(
        &self,
        endpoint: &ClusterEndpoint,
        control_panel_arn: &str,
    ) -> Result<Vec<RoutingControlSummary>>;

    /// Read the current state of a routing control.
    async fn get_routing_control_state(
        &self,
        endpoint: &ClusterEndpoint,
        routing_control_arn: &str,
    ) -> Result<ControlState>;

    /// Set the state of a routing control.
    async fn update_routing_control_state(
        &self,
        endpoint: &ClusterEndpoint,
        routing_control_arn: &str,
        state: ControlState,
    ) -> Result<()>;
}
