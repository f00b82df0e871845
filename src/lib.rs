//! # dr-orchestrator - Regional failover orchestration
//!
//! Drives a disaster-recovery cutover across two coupled tiers:
//! - **Routing**: traffic routing controls reached through redundant
//!   control-plane endpoints, reconciled idempotently
//! - **Region**: a global database cluster whose writer role is promoted
//!   to the target region and polled until it converges
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dr_orchestrator::config::Settings;
//! use dr_orchestrator::invocation::Orchestrator;
//! use dr_orchestrator::region::MemoryDatabase;
//! use dr_orchestrator::routing::MemoryControlPlane;
//! use dr_orchestrator::store::MemoryConfigStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(MemoryConfigStore::new()),
//!         Arc::new(MemoryControlPlane::new()),
//!         Arc::new(MemoryDatabase::new()),
//!         Settings::default(),
//!     );
//!     let result = orchestrator
//!         .handle_rds_failover(serde_json::json!({
//!             "primary_region": "us-east-1",
//!             "secondary_region": "us-west-2",
//!             "global_table": "orders",
//!             "action": "fail_over"
//!         }))
//!         .await;
//!     println!("error: {}", result.error);
//! }
//! ```

pub mod config;
pub mod core;
pub mod invocation;
pub mod region;
pub mod routing;
pub mod runbook;
pub mod scenario;
pub mod store;
pub mod telemetry;

pub use crate::core::error::{Error, ErrorKind, Result};
