//! Shared types used across Foundry crates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logical build: one unit of work spanning one or more containers,
/// identified by a correlation key.
///
/// Created exactly once, the first time any event bearing its
/// `build_key` is observed. Never updated or deleted by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Store-assigned identifier, immutable after creation.
    pub id: i64,
    /// Correlation key extracted from container labels. Unique — at most
    /// one build exists per distinct key.
    pub build_key: String,
    /// Recorded when the build row is created.
    pub start_time: DateTime<Utc>,
}

/// Kind of a recorded build event, resolved to a stable integer code in
/// the store at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildEventKind {
    /// A build container started.
    ContainerStarted,
    /// A build container stopped.
    ContainerStopped,
}

impl BuildEventKind {
    /// Symbolic name as registered in the event-code table.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildEventKind::ContainerStarted => "build_container_started",
            BuildEventKind::ContainerStopped => "build_container_stopped",
        }
    }
}

impl std::fmt::Display for BuildEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped, typed occurrence within a build's timeline.
/// Append-only; never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEvent {
    /// Owning build.
    pub build_id: i64,
    pub kind: BuildEventKind,
    /// Free-text label identifying the build step the event pertains to.
    pub name: String,
    /// Store-insertion time, not the runtime's original event time.
    pub time: DateTime<Utc>,
}

/// Observable status of a container lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatus {
    /// Container was created.
    Create,
    /// Container was destroyed.
    Destroy,
    /// Any other runtime status. Passed through unhandled so callers can
    /// observe statuses this daemon does not act on.
    Other(String),
}

impl From<&str> for ContainerStatus {
    fn from(s: &str) -> Self {
        match s {
            "create" => ContainerStatus::Create,
            "destroy" => ContainerStatus::Destroy,
            other => ContainerStatus::Other(other.to_string()),
        }
    }
}

/// One decoded container lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEvent {
    pub status: ContainerStatus,
    /// Label set attached to the container by its creator.
    pub attributes: HashMap<String, String>,
}

impl ContainerEvent {
    pub fn new(status: ContainerStatus, attributes: HashMap<String, String>) -> Self {
        Self { status, attributes }
    }

    /// Label value under `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
