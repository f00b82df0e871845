//! Common types used across the orchestrator.

use crate::core::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Binary state of a routing control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlState {
    /// Traffic flows through the cell behind the control
    On,
    /// Traffic is drained from the cell behind the control
    Off,
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlState::On => write!(f, "On"),
            ControlState::Off => write!(f, "Off"),
        }
    }
}

impl FromStr for ControlState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On" => Ok(ControlState::On),
            "Off" => Ok(ControlState::Off),
            other => Err(Error::InvalidInput(format!(
                "unknown routing control state '{other}', expected On or Off"
            ))),
        }
    }
}

/// Direction of a disaster-recovery cutover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverAction {
    /// Move traffic and the writer role to the secondary region
    FailOver,
    /// Return traffic and the writer role to the primary region
    FailBack,
}

impl std::fmt::Display for FailoverAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverAction::FailOver => write!(f, "fail_over"),
            FailoverAction::FailBack => write!(f, "fail_back"),
        }
    }
}

impl FromStr for FailoverAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail_over" => Ok(FailoverAction::FailOver),
            "fail_back" => Ok(FailoverAction::FailBack),
            other => Err(Error::InvalidInput(format!(
                "unknown action '{other}', expected fail_over or fail_back"
            ))),
        }
    }
}

/// A redundant control-plane endpoint.
///
/// Any endpoint of a cluster may serve any request. The address is stored
/// under `arn` in configuration records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    /// Control-plane address
    #[serde(rename = "arn", alias = "url")]
    pub url: String,
    /// Region hosting the endpoint
    pub region: String,
}

impl ClusterEndpoint {
    /// Create a new endpoint.
    pub fn new(url: &str, region: &str) -> Self {
        Self {
            url: url.to_string(),
            region: region.to_string(),
        }
    }
}

impl std::fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.url, self.region)
    }
}

/// One invocation's worth of routing work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverRequest {
    pub action: FailoverAction,
    pub desired_state: ControlState,
    /// Recovery cluster the controls belong to
    pub cluster_id: String,
}

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_state_parse() {
        assert_eq!("On".parse::<ControlState>().unwrap(), ControlState::On);
        assert_eq!("Off".parse::<ControlState>().unwrap(), ControlState::Off);
        assert!("on".parse::<ControlState>().is_err());
    }

    #[test]
    fn test_action_serde_names() {
        let json = serde_json::to_string(&FailoverAction::FailBack).unwrap();
        assert_eq!(json, "\"fail_back\"");
        let parsed: FailoverAction = serde_json::from_str("\"fail_over\"").unwrap();
        assert_eq!(parsed, FailoverAction::FailOver);
    }

    #[test]
    fn test_endpoint_reads_arn_key() {
        let endpoint: ClusterEndpoint = serde_json::from_str(
            r#"{"arn": "https://host-aaaaaa.us-east-1.example", "region": "us-east-1"}"#,
        )
        .unwrap();
        assert_eq!(endpoint.url, "https://host-aaaaaa.us-east-1.example");
        assert_eq!(endpoint.region, "us-east-1");
    }
}
