//! foundry-source — typed channel over the Docker events feed.
//!
//! Subscribes to the Docker daemon's `/events` endpoint, pre-filtered to
//! container events carrying the Foundry marker label, and pumps each
//! decoded frame into an in-process channel as one [`SourceSignal`].
//!
//! # Signals
//!
//! - `Event` — one container lifecycle notification with its label set.
//! - `Closed` — the feed ended cleanly (daemon shutdown).
//! - `Errored` — the feed failed. Distinct from `Closed` so the caller
//!   can decide whether to reconnect.
//!
//! Malformed frames are logged and dropped; they never terminate the
//! pump or reach the correlator.

pub mod convert;
pub mod source;

pub use source::{EventSource, SourceError, SourceResult, SourceSignal};
