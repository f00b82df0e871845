//! Routing Control Module
//!
//! Traffic cutover through redundant control-plane endpoints:
//! - Endpoint selection with randomized fallback
//! - Name to backend identifier resolution
//! - Idempotent state reconciliation

pub mod cluster;
pub mod control_plane;
pub mod memory;
pub mod reconciler;
pub mod resolver;
pub mod selector;

pub use cluster::RecoveryCluster;
pub use control_plane::{ControlPlane, RoutingControlSummary};
pub use memory::MemoryControlPlane;
pub use reconciler::{reconcile, ControlOutcome, ReconcileReport};
pub use resolver::{resolve, GroupSide, RoutingControl, RoutingControlGroup};
pub use selector::{try_in_order, trial_order, Attempt, EndpointFailure, EndpointSelector};
