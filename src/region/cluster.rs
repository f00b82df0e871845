//! Global database cluster topology.
//!
//! A global cluster spans regions: one writer member, readers elsewhere.

use crate::core::{FailoverAction, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Global cluster status as reported by the database service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterStatus {
    /// Cluster is serving and no operation is in flight
    Available,
    /// Cluster is being modified
    Modifying,
    /// Writer role is moving between members
    FailingOver,
    /// Cluster is being created
    Creating,
    /// Cluster is being deleted
    Deleting,
    /// Any status this crate does not model
    #[serde(other)]
    Unknown,
}

impl ClusterStatus {
    /// Check if the cluster has converged.
    pub fn is_available(&self) -> bool {
        matches!(self, ClusterStatus::Available)
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterStatus::Available => write!(f, "available"),
            ClusterStatus::Modifying => write!(f, "modifying"),
            ClusterStatus::FailingOver => write!(f, "failing-over"),
            ClusterStatus::Creating => write!(f, "creating"),
            ClusterStatus::Deleting => write!(f, "deleting"),
            ClusterStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A regional member of a global cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Member cluster ARN
    pub arn: String,
    /// Region hosting the member
    pub region: String,
    /// Holds the writer role
    pub is_writer: bool,
}

impl ClusterMember {
    /// Create a reader member.
    pub fn reader(arn: &str, region: &str) -> Self {
        Self {
            arn: arn.to_string(),
            region: region.to_string(),
            is_writer: false,
        }
    }

    /// Create the writer member.
    pub fn writer(arn: &str, region: &str) -> Self {
        Self {
            is_writer: true,
            ..Self::reader(arn, region)
        }
    }
}

/// Snapshot of a global cluster.
///
/// Always fetched fresh; never reused across polls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCluster {
    /// Global cluster identifier
    pub id: String,
    /// Regional members
    pub members: Vec<ClusterMember>,
    /// Current status
    pub status: ClusterStatus,
}

impl GlobalCluster {
    /// The member holding the writer role.
    pub fn writer(&self) -> Option<&ClusterMember> {
        self.members.iter().find(|m| m.is_writer)
    }

    /// Reader member hosted in `region`.
    pub fn reader_in(&self, region: &str) -> Option<&ClusterMember> {
        self.members
            .iter()
            .find(|m| !m.is_writer && m.region == region)
    }

    /// Check if the writer role is held in `region`.
    pub fn writer_in(&self, region: &str) -> bool {
        self.writer().is_some_and(|w| w.region == region)
    }
}

/// Primary and secondary region of a deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPair {
    pub primary: String,
    pub secondary: String,
}

impl RegionPair {
    pub fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    /// Region that should hold the writer role after `action`.
    pub fn target(&self, action: FailoverAction) -> &str {
        match action {
            FailoverAction::FailOver => &self.secondary,
            FailoverAction::FailBack => &self.primary,
        }
    }
}

/// Remote database service managing global clusters.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    /// Describe a global cluster.
    async fn describe_global_cluster(&self, id: &str) -> Result<GlobalCluster>;

    /// Ask the service to move the writer role to `target_member_arn`.
    ///
    /// Returns once the request is accepted, not once it completes.
    async fn failover_global_cluster(&self, id: &str, target_member_arn: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> GlobalCluster {
        GlobalCluster {
            id: "orders".to_string(),
            members: vec![
                ClusterMember::writer("arn:rds:us-east-1:cluster:orders-east", "us-east-1"),
                ClusterMember::reader("arn:rds:us-west-2:cluster:orders-west", "us-west-2"),
            ],
            status: ClusterStatus::Available,
        }
    }

    #[test]
    fn test_roles() {
        let cluster = cluster();
        assert_eq!(cluster.writer().unwrap().region, "us-east-1");
        assert!(cluster.writer_in("us-east-1"));
        assert!(!cluster.writer_in("us-west-2"));
        assert!(cluster.reader_in("us-west-2").is_some());
        assert!(cluster.reader_in("us-east-1").is_none());
    }

    #[test]
    fn test_region_pair_target() {
        let pair = RegionPair::new("us-east-1", "us-west-2");
        assert_eq!(pair.target(FailoverAction::FailOver), "us-west-2");
        assert_eq!(pair.target(FailoverAction::FailBack), "us-east-1");
    }

    #[test]
    fn test_status_names() {
        let status: ClusterStatus = serde_json::from_str("\"failing-over\"").unwrap();
        assert_eq!(status, ClusterStatus::FailingOver);
        let status: ClusterStatus = serde_json::from_str("\"backtracking\"").unwrap();
        assert_eq!(status, ClusterStatus::Unknown);
        assert!(!status.is_available());
    }
}
