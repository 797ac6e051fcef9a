use httproute_controller_core::ResourceId;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reconciliation failures. All of them are retryable; invalid annotations
/// are reported on the Service rather than returned as errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A write lost an optimistic concurrency check.
    #[error("{kind} {id} was modified concurrently")]
    Conflict { kind: String, id: ResourceId },

    #[error("failed to {verb} {kind} {id}: {source}")]
    Api {
        verb: &'static str,
        kind: String,
        id: ResourceId,
        #[source]
        source: httproute_controller_k8s_api::Error,
    },

    #[error("failed to list {kind} matching {selector}: {source}")]
    List {
        kind: String,
        selector: String,
        #[source]
        source: httproute_controller_k8s_api::Error,
    },

    #[error("reconciliation did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Service is missing its namespace, name or uid")]
    Unidentified,
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
