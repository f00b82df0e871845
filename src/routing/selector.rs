//! Endpoint selection over redundant control-plane endpoints.
//!
//! Each call shuffles the endpoints and tries them one at a time until one
//! answers. No endpoint is tried twice within a call and nothing carries
//! over between calls except the random source.

use crate::core::{ClusterEndpoint, Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// An endpoint that failed during a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFailure {
    pub endpoint: ClusterEndpoint,
    pub message: String,
}

/// Successful outcome of a sequential trial.
#[derive(Clone, Debug)]
pub struct Attempt<T> {
    /// Value returned by the endpoint that answered
    pub value: T,
    /// Endpoint that answered
    pub endpoint: ClusterEndpoint,
    /// 1-based position of that endpoint in the trial order
    pub attempt: usize,
    /// Endpoints that failed before it
    pub failures: Vec<EndpointFailure>,
}

impl<T> Attempt<T> {
    /// True if the first endpoint tried answered.
    pub fn first_try(&self) -> bool {
        self.attempt == 1
    }

    /// Drop the bookkeeping and keep the value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Uniformly shuffled copy of `endpoints`.
pub fn trial_order<R: Rng + ?Sized>(endpoints: &[ClusterEndpoint], rng: &mut R) -> Vec<ClusterEndpoint> {
    let mut order = endpoints.to_vec();
    order.shuffle(rng);
    order
}

/// Run `operation` against each endpoint of `order` until one succeeds.
///
/// Fails with [`Error::AllEndpointsUnavailable`] carrying the last error if
/// every endpoint fails.
pub async fn try_in_order<T, F, Fut>(order: Vec<ClusterEndpoint>, mut operation: F) -> Result<Attempt<T>>
where
    F: FnMut(ClusterEndpoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if order.is_empty() {
        return Err(Error::NoEndpoints);
    }

    let total = order.len();
    let mut failures = Vec::new();
    let mut last_error = None;

    for (index, endpoint) in order.into_iter().enumerate() {
        match operation(endpoint.clone()).await {
            Ok(value) => {
                debug!(endpoint = %endpoint.url, attempt = index + 1, "Endpoint answered");
                return Ok(Attempt {
                    value,
                    endpoint,
                    attempt: index + 1,
                    failures,
                });
            }
            Err(err) => {
                warn!(
                    endpoint = %endpoint.url,
                    region = %endpoint.region,
                    attempt = index + 1,
                    of = total,
                    error = %err,
                    "Endpoint failed, trying next"
                );
                failures.push(EndpointFailure {
                    endpoint,
                    message: err.to_string(),
                });
                last_error = Some(err);
            }
        }
    }

    Err(Error::AllEndpointsUnavailable {
        attempts: total,
        last: Box::new(last_error.unwrap_or(Error::NoEndpoints)),
    })
}

/// Redundant endpoints of one recovery cluster plus a random source.
pub struct EndpointSelector<R = StdRng> {
    endpoints: Vec<ClusterEndpoint>,
    rng: Mutex<R>,
}

impl EndpointSelector<StdRng> {
    /// Create a selector seeded from the OS.
    pub fn new(endpoints: Vec<ClusterEndpoint>) -> Result<Self> {
        Self::with_rng(endpoints, StdRng::from_entropy())
    }

    /// Create a selector with a reproducible trial order.
    pub fn seeded(endpoints: Vec<ClusterEndpoint>, seed: u64) -> Result<Self> {
        Self::with_rng(endpoints, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> EndpointSelector<R> {
    /// Create a selector drawing trial orders from `rng`.
    pub fn with_rng(endpoints: Vec<ClusterEndpoint>, rng: R) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        Ok(Self {
            endpoints,
            rng: Mutex::new(rng),
        })
    }

    /// Draw a fresh trial order.
    pub fn trial_order(&self) -> Vec<ClusterEndpoint> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        trial_order(&self.endpoints, &mut *rng)
    }

    /// Shuffle the endpoints and run `operation` until one answers.
    pub async fn try_sequential<T, F, Fut>(&self, operation: F) -> Result<Attempt<T>>
    where
        F: FnMut(ClusterEndpoint) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let order = self.trial_order();
        try_in_order(order, operation).await
    }
}
