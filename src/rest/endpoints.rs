//! Endpoint set with round-robin rotation.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::seq::SliceRandom;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Equivalent service base URLs.
///
/// Shuffled once on construction to spread load across clients, then
/// immutable. Stores an internal counter to rotate the starting endpoint
/// across successive calls.
#[derive(Debug)]
pub struct EndpointSet {
    endpoints: Vec<Url>,
    counter: AtomicUsize,
}

impl EndpointSet {
    /// Build a shuffled endpoint set.
    pub fn new(endpoints: Vec<Url>) -> ClientResult<Self> {
        let mut set = Self::ordered(endpoints)?;
        set.endpoints.shuffle(&mut rand::thread_rng());
        Ok(set)
    }

    /// Build an endpoint set that keeps the given order.
    pub fn ordered(endpoints: Vec<Url>) -> ClientResult<Self> {
        if endpoints.is_empty() {
            return Err(ClientError::Configuration(
                "at least one service endpoint is required".into(),
            ));
        }
        if let Some(bad) = endpoints.iter().find(|url| url.cannot_be_a_base()) {
            return Err(ClientError::Configuration(format!(
                "endpoint {bad} cannot be used as a base URL"
            )));
        }
        Ok(Self {
            endpoints,
            counter: AtomicUsize::new(0),
        })
    }

    /// Parse and shuffle a list of endpoint strings.
    pub fn parse<S: AsRef<str>>(endpoints: &[S]) -> ClientResult<Self> {
        let urls = endpoints
            .iter()
            .map(|raw| {
                Url::parse(raw.as_ref()).map_err(|e| {
                    ClientError::Configuration(format!("invalid endpoint '{}': {e}", raw.as_ref()))
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;
        Self::new(urls)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn as_slice(&self) -> &[Url] {
        &self.endpoints
    }

    /// Claim the starting index for one call and advance the rotation.
    pub fn next_start(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed) % self.endpoints.len()
    }

    /// Endpoint tried on `attempt` of a call that started at `start`.
    pub fn at(&self, start: usize, attempt: usize) -> &Url {
        &self.endpoints[(start + attempt) % self.endpoints.len()]
    }
}
