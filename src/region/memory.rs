//! In-memory database service.
//!
//! A promotion flips member roles immediately; the statuses reported
//! afterwards can be scripted to exercise convergence polling.

use crate::core::{Error, Result};
use crate::region::cluster::{ClusterStatus, DatabaseService, GlobalCluster};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    clusters: HashMap<String, GlobalCluster>,
    scripts: HashMap<String, VecDeque<ClusterStatus>>,
    describe_calls: usize,
    failover_calls: Vec<(String, String)>,
    fail_describe_after: Option<usize>,
}

/// Database service backed by process memory.
#[derive(Default)]
pub struct MemoryDatabase {
    inner: Mutex<Inner>,
}

impl MemoryDatabase {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register or replace a global cluster.
    pub fn insert(&self, cluster: GlobalCluster) {
        self.lock().clusters.insert(cluster.id.clone(), cluster);
    }

    /// Statuses reported by successive describes, before settling on the
    /// cluster's stored status.
    pub fn script_statuses(&self, id: &str, statuses: Vec<ClusterStatus>) {
        self.lock()
            .scripts
            .insert(id.to_string(), statuses.into_iter().collect());
    }

    /// Fail every describe after the first `n`.
    pub fn fail_describe_after(&self, n: usize) {
        self.lock().fail_describe_after = Some(n);
    }

    /// Stored snapshot of a cluster.
    pub fn cluster(&self, id: &str) -> Option<GlobalCluster> {
        self.lock().clusters.get(id).cloned()
    }

    /// Number of describe calls received.
    pub fn describe_calls(&self) -> usize {
        self.lock().describe_calls
    }

    /// Promotion requests received, as (cluster, target member).
    pub fn failover_calls(&self) -> Vec<(String, String)> {
        self.lock().failover_calls.clone()
    }
}

#[async_trait]
impl DatabaseService for MemoryDatabase {
    async fn describe_global_cluster(&self, id: &str) -> Result<GlobalCluster> {
        let mut inner = self.lock();
        inner.describe_calls += 1;
        if let Some(limit) = inner.fail_describe_after {
            if inner.describe_calls > limit {
                return Err(Error::Database("describe throttled".to_string()));
            }
        }

        let scripted = inner.scripts.get_mut(id).and_then(VecDeque::pop_front);
        let mut cluster = inner
            .clusters
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ClusterNotFound(id.to_string()))?;
        if let Some(status) = scripted {
            cluster.status = status;
        }
        Ok(cluster)
    }

    async fn failover_global_cluster(&self, id: &str, target_member_arn: &str) -> Result<()> {
        let mut inner = self.lock();
        inner
            .failover_calls
            .push((id.to_string(), target_member_arn.to_string()));

        let cluster = inner
            .clusters
            .get_mut(id)
            .ok_or_else(|| Error::ClusterNotFound(id.to_string()))?;
        if !cluster.members.iter().any(|m| m.arn == target_member_arn) {
            return Err(Error::Database(format!(
                "{target_member_arn} is not a member of {id}"
            )));
        }
        for member in cluster.members.iter_mut() {
            member.is_writer = member.arn == target_member_arn;
        }
        cluster.status = ClusterStatus::Available;
        Ok(())
    }
}
