//! Snapshot fetcher port: the vendor cloud seen from the polling core.

use std::future::Future;
use std::sync::Arc;

use atmolink_domain::equipment::EquipmentKind;
use atmolink_domain::id::EquipmentId;
use atmolink_domain::snapshot::Snapshot;

/// Failure to obtain a snapshot.
///
/// Transient failures leave the node status untouched and are simply retried
/// on the next tick; every other variant takes the node offline with the
/// error message as reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("cloud api unavailable: {0}")]
    Unavailable(String),

    #[error("equipment {0} not found in cloud answer")]
    MissingEquipment(String),

    #[error("{0} api is disabled by configuration")]
    Disabled(&'static str),

    #[error("malformed cloud answer: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether retrying later may succeed without any change on our side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }
}

/// Fetches device snapshots from the vendor cloud.
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch the current snapshot of one device.
    fn fetch(
        &self,
        id: &EquipmentId,
        kind: EquipmentKind,
    ) -> impl Future<Output = Result<Snapshot, FetchError>> + Send;

    /// Fetch every device visible to the account, for discovery.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Snapshot>, FetchError>> + Send;

    /// Check that the account can be reached and authenticated.
    fn check_connection(&self) -> impl Future<Output = Result<(), FetchError>> + Send;
}

impl<T: SnapshotFetcher> SnapshotFetcher for Arc<T> {
    fn fetch(
        &self,
        id: &EquipmentId,
        kind: EquipmentKind,
    ) -> impl Future<Output = Result<Snapshot, FetchError>> + Send {
        (**self).fetch(id, kind)
    }

    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Snapshot>, FetchError>> + Send {
        (**self).fetch_all()
    }

    fn check_connection(&self) -> impl Future<Output = Result<(), FetchError>> + Send {
        (**self).check_connection()
    }
}
