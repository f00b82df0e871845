//! Error types for the orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while failing over or failing back.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required input field: {0}")]
    MissingField(String),

    #[error("No record for key '{key}' in table '{table}'")]
    RecordNotFound { table: String, key: String },

    #[error("No control-plane endpoints configured")]
    NoEndpoints,

    #[error("Mismatch in routing controls: {primary} primary vs {secondary} secondary")]
    RoutingControlMismatch { primary: usize, secondary: usize },

    #[error("Routing controls not found on control panel: {}", names.join(", "))]
    UnresolvedRoutingControls { names: Vec<String> },

    #[error("No routing controls declared")]
    EmptyRoutingControlGroup,

    // Control-plane errors
    #[error("Endpoint {endpoint} unavailable: {message}")]
    EndpointUnavailable { endpoint: String, message: String },

    #[error("Control plane rejected request: {0}")]
    ControlPlane(String),

    #[error("All {attempts} control-plane endpoints failed, last error: {last}")]
    AllEndpointsUnavailable {
        attempts: usize,
        #[source]
        last: Box<Error>,
    },

    #[error("Routing control '{control_name}' could not be reconciled: {source}")]
    ReconciliationFailed {
        control_name: String,
        #[source]
        source: Box<Error>,
        /// Controls already switched before the failure; they are not rolled back
        applied: Vec<String>,
    },

    // Database errors
    #[error("Global cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Global cluster {0} has no writer member")]
    NoWriter(String),

    #[error("Global cluster {cluster} has no reader member in region {region}")]
    NoReaderInRegion { cluster: String, region: String },

    #[error("Global cluster {cluster} not available after {attempts} polls")]
    PromotionTimedOut { cluster: String, attempts: u32 },

    #[error("Database service error: {0}")]
    Database(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure taxonomy reported at the invocation boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or inconsistent input; re-invoking will not help
    Configuration,
    /// Every redundant endpoint failed
    EndpointUnavailable,
    /// A routing control update failed part-way through a group
    Reconciliation,
    /// The database promotion or its convergence poll failed
    PromotionPoll,
    /// Anything else
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_)
            | Error::MissingField(_)
            | Error::RecordNotFound { .. }
            | Error::NoEndpoints
            | Error::RoutingControlMismatch { .. }
            | Error::UnresolvedRoutingControls { .. }
            | Error::EmptyRoutingControlGroup
            | Error::SerializationError(_) => ErrorKind::Configuration,
            Error::EndpointUnavailable { .. }
            | Error::ControlPlane(_)
            | Error::AllEndpointsUnavailable { .. } => ErrorKind::EndpointUnavailable,
            Error::ReconciliationFailed { .. } => ErrorKind::Reconciliation,
            Error::ClusterNotFound(_)
            | Error::NoWriter(_)
            | Error::NoReaderInRegion { .. }
            | Error::PromotionTimedOut { .. }
            | Error::Database(_) => ErrorKind::PromotionPoll,
            Error::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
