//! Recovery cluster client.
//!
//! Pairs a [`ControlPlane`] with the cluster's endpoint selector so every
//! call goes out through a fresh randomized endpoint order.

use crate::core::{ControlState, Result};
use crate::routing::control_plane::{ControlPlane, RoutingControlSummary};
use crate::routing::selector::{Attempt, EndpointSelector};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

/// Client for one recovery cluster.
pub struct RecoveryCluster<R = StdRng> {
    plane: Arc<dyn ControlPlane>,
    selector: EndpointSelector<R>,
}

impl<R: Rng + Send> RecoveryCluster<R> {
    /// Create a client over `plane` reaching it through `selector`.
    pub fn new(plane: Arc<dyn ControlPlane>, selector: EndpointSelector<R>) -> Self {
        Self { plane, selector }
    }

    /// List the routing controls of a control panel.
    pub async fn list_routing_controls(
        &self,
        control_panel_arn: &str,
    ) -> Result<Attempt<Vec<RoutingControlSummary>>> {
        let plane = self.plane.as_ref();
        self.selector
            .try_sequential(|endpoint| async move {
                plane.list_routing_controls(&endpoint, control_panel_arn).await
            })
            .await
    }

    /// Read the state of a routing control.
    pub async fn get_state(&self, routing_control_arn: &str) -> Result<Attempt<ControlState>> {
        let plane = self.plane.as_ref();
        self.selector
            .try_sequential(|endpoint| async move {
                plane
                    .get_routing_control_state(&endpoint, routing_control_arn)
                    .await
            })
            .await
    }

    /// Set the state of a routing control.
    pub async fn set_state(&self, routing_control_arn: &str, state: ControlState) -> Result<Attempt<()>> {
        let plane = self.plane.as_ref();
        self.selector
            .try_sequential(|endpoint| async move {
                plane
                    .update_routing_control_state(&endpoint, routing_control_arn, state)
                    .await
            })
            .await
    }
}
