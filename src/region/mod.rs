//! Multi-region Module
//!
//! Provides the database tier of a regional cutover:
//! - Global cluster topology
//! - Writer promotion and convergence polling

pub mod cluster;
pub mod failover;
pub mod memory;

pub use cluster::{ClusterMember, ClusterStatus, DatabaseService, GlobalCluster, RegionPair};
pub use failover::{DatabaseFailoverController, PollPolicy, PromotionReport, PromotionState};
pub use memory::MemoryDatabase;
