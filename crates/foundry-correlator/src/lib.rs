//! foundry-correlator — the event correlation pipeline.
//!
//! Consumes container lifecycle notifications from the event source,
//! resolves each one to its owning build (creating the build on first
//! sight of a correlation key), and appends a typed event to the build's
//! timeline in the store.
//!
//! # Concurrency
//!
//! The run loop dispatches one task per notification, so handlers for
//! separate notifications may overlap. The only cross-handler invariant
//! is build uniqueness per correlation key, and that is guaranteed by
//! the store's insert-if-absent create — two handlers racing on a new
//! key both end up referencing the single winning row. No in-process
//! locking is needed, and unrelated builds never serialize on each
//! other.

pub mod handler;

pub use handler::{CorrelateError, Correlator, Outcome};
