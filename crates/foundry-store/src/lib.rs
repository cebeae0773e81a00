//! foundry-store — build and event persistence for Foundry.
//!
//! Defines the [`BuildStore`] contract the correlator depends on and two
//! implementations: [`PgStore`] over a Postgres connection pool for the
//! daemon, and [`MemoryStore`] for tests.
//!
//! # Contract
//!
//! Three operations, all safe for concurrent callers:
//!
//! - `find_build` — exact-match lookup by correlation key.
//! - `create_build` — insert-if-absent; the unique constraint on
//!   `build_key` makes creation atomic, and a lost race surfaces as
//!   [`CreateOutcome::AlreadyExists`] rather than an error.
//! - `add_event` — appends one timeline event, resolving the symbolic
//!   event kind to its integer code inside the insert.
//!
//! Builds are created once and never mutated; events are append-only.

pub mod error;
pub mod memory;
pub mod pg;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{BuildStore, CreateOutcome};
