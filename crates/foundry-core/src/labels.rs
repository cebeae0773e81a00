//! Container label conventions.
//!
//! Every container Foundry manages carries a marker label so the event
//! subscription can filter at the daemon, plus two correlation labels
//! set by whatever launches the build containers.

/// Marker label key identifying containers managed by this system.
pub const MANAGED_BY_LABEL: &str = "created-by";

/// Default value for [`MANAGED_BY_LABEL`].
pub const MANAGED_BY_VALUE: &str = "foundry";

/// Label carrying the correlation key — which logical build a container
/// belongs to.
pub const BUILD_KEY_LABEL: &str = "build-id";

/// Label naming the build step the container executes.
pub const BUILD_STEP_LABEL: &str = "build-step";
