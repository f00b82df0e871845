//! Configuration store client.
//!
//! Routing-control name maps and endpoint lists live in a key-value store,
//! one document per cluster keyed by `arcClusterName`. The store itself is
//! an external collaborator behind [`ConfigStore`].

pub mod memory;

pub use memory::MemoryConfigStore;

use crate::core::{ClusterEndpoint, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Partition key of every configuration table.
pub const PARTITION_KEY: &str = "arcClusterName";

/// Key-value lookup of configuration documents.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the single document stored under `key`.
    ///
    /// Returns None if no document exists.
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>>;

    /// Fetch every document stored under `key`.
    async fn query(&self, table: &str, key: &str) -> Result<Vec<Value>>;
}

/// Endpoint list of one recovery cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    pub arc_cluster_name: String,
    pub endpoints: Vec<ClusterEndpoint>,
}

/// Logical routing-control names declared for one direction of cutover.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredControls {
    /// Controls fronting the primary region
    pub primary: Vec<String>,
    /// Controls fronting the secondary region
    pub secondary: Vec<String>,
}

/// Routing-control map of one recovery cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingControlRecord {
    pub arc_cluster_name: String,
    #[serde(alias = "controlPanelId")]
    pub control_panel_arn: String,
    pub routing_controls: DeclaredControls,
}

/// Load the endpoint list for `cluster` from `table`.
///
/// The first matching document wins; an empty endpoint list is rejected.
pub async fn fetch_endpoints(
    store: &dyn ConfigStore,
    table: &str,
    cluster: &str,
) -> Result<Vec<ClusterEndpoint>> {
    let item = store
        .query(table, cluster)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::RecordNotFound {
            table: table.to_string(),
            key: cluster.to_string(),
        })?;

    let record: EndpointRecord = serde_json::from_value(item)?;
    if record.endpoints.is_empty() {
        return Err(Error::NoEndpoints);
    }

    debug!(table, cluster, count = record.endpoints.len(), "Loaded cluster endpoints");
    Ok(record.endpoints)
}

/// Load the routing-control map for `cluster` from `table`.
pub async fn fetch_routing_controls(
    store: &dyn ConfigStore,
    table: &str,
    cluster: &str,
) -> Result<RoutingControlRecord> {
    let item = store
        .get(table, cluster)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            table: table.to_string(),
            key: cluster.to_string(),
        })?;

    let record: RoutingControlRecord = serde_json::from_value(item)?;
    debug!(
        table,
        cluster,
        primary = record.routing_controls.primary.len(),
        secondary = record.routing_controls.secondary.len(),
        "Loaded routing control map"
    );
    Ok(record)
}
