//! In-memory build store (for testing).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use foundry_core::{Build, BuildEvent, BuildEventKind};

use crate::error::{StoreError, StoreResult};
use crate::store::{BuildStore, CreateOutcome};

struct Inner {
    next_id: i64,
    /// build_key → build. The map key doubles as the unique constraint.
    builds: HashMap<String, Build>,
    events: Vec<BuildEvent>,
    /// Registered event codes, mirroring the seeded EVENT_CODE table.
    codes: HashMap<&'static str, i32>,
}

/// Ephemeral build store holding everything behind one mutex.
///
/// Check-and-insert in `create_build` happens under a single lock
/// acquisition, which gives the same uniqueness guarantee the Postgres
/// implementation gets from its unique constraint.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let codes = HashMap::from([
            (BuildEventKind::ContainerStarted.as_str(), 1),
            (BuildEventKind::ContainerStopped.as_str(), 2),
        ]);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 1,
                builds: HashMap::new(),
                events: Vec::new(),
                codes,
            })),
        }
    }

    /// All builds, in no particular order.
    pub async fn builds(&self) -> Vec<Build> {
        self.inner.lock().await.builds.values().cloned().collect()
    }

    /// All recorded events, in append order.
    pub async fn events(&self) -> Vec<BuildEvent> {
        self.inner.lock().await.events.clone()
    }

    /// Events belonging to one build, in append order.
    pub async fn events_for(&self, build_id: i64) -> Vec<BuildEvent> {
        self.inner
            .lock()
            .await
            .events
            .iter()
            .filter(|e| e.build_id == build_id)
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildStore for MemoryStore {
    async fn find_build(&self, build_key: &str) -> StoreResult<Option<Build>> {
        Ok(self.inner.lock().await.builds.get(build_key).cloned())
    }

    async fn create_build(
        &self,
        build_key: &str,
        start_time: DateTime<Utc>,
    ) -> StoreResult<CreateOutcome> {
        let mut inner = self.inner.lock().await;
        if inner.builds.contains_key(build_key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.builds.insert(
            build_key.to_string(),
            Build {
                id,
                build_key: build_key.to_string(),
                start_time,
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn add_event(
        &self,
        build_id: i64,
        kind: BuildEventKind,
        name: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.codes.contains_key(kind.as_str()) {
            return Err(StoreError::UnknownEventType(kind.as_str().to_string()));
        }
        if !inner.builds.values().any(|b| b.id == build_id) {
            return Err(StoreError::BuildNotFound(build_id));
        }
        inner.events.push(BuildEvent {
            build_id,
            kind,
            name: name.to_string(),
            time,
        });
        Ok(())
    }
}
