//! The store contract the correlator depends on.

use std::future::Future;

use chrono::{DateTime, Utc};
use foundry_core::{Build, BuildEventKind};

use crate::error::StoreResult;

/// Outcome of [`BuildStore::create_build`].
///
/// Losing a creation race is not an error: the caller re-reads the
/// winning row and proceeds as though it had existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// This caller inserted the row.
    Created,
    /// Another caller got there first (or the build predates this call).
    AlreadyExists,
}

/// Durable store for builds and their event timelines.
///
/// Implementations must guarantee build uniqueness per `build_key` under
/// concurrent `create_build` callers — insert-if-absent at the storage
/// boundary, never an application-level check-then-act. Methods return
/// `Send` futures so handlers holding a store handle can be spawned onto
/// the runtime.
pub trait BuildStore: Clone + Send + Sync + 'static {
    /// Exact-match lookup by correlation key.
    fn find_build(
        &self,
        build_key: &str,
    ) -> impl Future<Output = StoreResult<Option<Build>>> + Send;

    /// Insert a build if no row with this `build_key` exists yet.
    fn create_build(
        &self,
        build_key: &str,
        start_time: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<CreateOutcome>> + Send;

    /// Append one event to a build's timeline, resolving `kind` to its
    /// registered integer code.
    ///
    /// Fails with [`crate::StoreError::BuildNotFound`] if `build_id` does
    /// not exist and [`crate::StoreError::UnknownEventType`] if `kind`
    /// has no registered code.
    fn add_event(
        &self,
        build_id: i64,
        kind: BuildEventKind,
        name: &str,
        time: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}
