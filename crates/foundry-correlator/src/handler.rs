//! Notification handling and build resolution.

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use foundry_core::labels::{BUILD_KEY_LABEL, BUILD_STEP_LABEL};
use foundry_core::{Build, BuildEventKind, ContainerEvent, ContainerStatus};
use foundry_source::SourceSignal;
use foundry_store::{BuildStore, CreateOutcome, StoreError};

/// Errors that can occur while recording a notification.
///
/// A lost creation race is not one of these — the store reports it as a
/// normal outcome and the handler re-reads the winning row.
#[derive(Debug, Error)]
pub enum CorrelateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The build disappeared between creation and re-read. Nothing in
    /// this system deletes builds, so this indicates outside
    /// interference with the store.
    #[error("build {build_key:?} vanished after creation")]
    BuildVanished { build_key: String },
}

/// What a handled notification amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An event was appended to the build's timeline.
    Recorded { build_id: i64, kind: BuildEventKind },
    /// The status is not one the correlator acts on.
    Ignored,
    /// The notification carried no correlation label; nothing was
    /// written. This is the documented no-op path for containers
    /// outside this system's management, not an error.
    Unmatched,
}

/// Correlates container notifications onto build timelines.
///
/// Holds only a store handle, so cloning is cheap and each in-flight
/// notification can own a handler.
#[derive(Clone)]
pub struct Correlator<S> {
    store: S,
}

impl<S: BuildStore> Correlator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record one notification.
    ///
    /// `create` appends a started event, `destroy` a stopped event, and
    /// every other status is ignored. Per notification this performs at
    /// most one lookup, at most one conditional create, and exactly one
    /// append when a build is resolved.
    pub async fn handle(&self, event: ContainerEvent) -> Result<Outcome, CorrelateError> {
        let kind = match &event.status {
            ContainerStatus::Create => BuildEventKind::ContainerStarted,
            ContainerStatus::Destroy => BuildEventKind::ContainerStopped,
            ContainerStatus::Other(status) => {
                debug!(%status, "ignoring container status");
                return Ok(Outcome::Ignored);
            }
        };

        let Some(build) = self.resolve_build(&event).await? else {
            debug!("notification without a correlation label, nothing to record");
            return Ok(Outcome::Unmatched);
        };

        let step = event.attribute(BUILD_STEP_LABEL).unwrap_or_default();
        self.store.add_event(build.id, kind, step, Utc::now()).await?;
        debug!(build_id = build.id, %kind, step, "build event recorded");

        Ok(Outcome::Recorded {
            build_id: build.id,
            kind,
        })
    }

    /// Resolve the build a notification belongs to, creating it on first
    /// sight of its correlation key.
    ///
    /// Creation is insert-if-absent at the storage boundary, so two
    /// handlers racing on the same new key cannot produce two builds;
    /// the loser re-reads the winner's row.
    async fn resolve_build(&self, event: &ContainerEvent) -> Result<Option<Build>, CorrelateError> {
        let Some(build_key) = event.attribute(BUILD_KEY_LABEL) else {
            return Ok(None);
        };

        if let Some(build) = self.store.find_build(build_key).await? {
            return Ok(Some(build));
        }

        match self.store.create_build(build_key, Utc::now()).await? {
            CreateOutcome::Created => info!(%build_key, "build registered"),
            CreateOutcome::AlreadyExists => {
                debug!(%build_key, "lost creation race, reusing existing build");
            }
        }

        let build = self
            .store
            .find_build(build_key)
            .await?
            .ok_or_else(|| CorrelateError::BuildVanished {
                build_key: build_key.to_string(),
            })?;
        Ok(Some(build))
    }

    /// Drain the source channel until it terminates or shutdown is
    /// signalled, dispatching one task per notification.
    ///
    /// Handlers may overlap; a store failure loses that notification's
    /// effect and is logged with enough context to reconcile by hand.
    /// Shutdown stops accepting new notifications but does not cancel
    /// in-flight writes.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<SourceSignal>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                signal = events.recv() => match signal {
                    Some(SourceSignal::Event(event)) => {
                        let correlator = self.clone();
                        tokio::spawn(async move {
                            if let Err(e) = correlator.handle(event.clone()).await {
                                error!(
                                    build_key = ?event.attribute(BUILD_KEY_LABEL),
                                    status = ?event.status,
                                    notification = ?event,
                                    error = %e,
                                    "failed to record notification",
                                );
                            }
                        });
                    }
                    Some(SourceSignal::Closed) => {
                        info!("event source closed");
                        break;
                    }
                    Some(SourceSignal::Errored(msg)) => {
                        error!(error = %msg, "event source failed");
                        break;
                    }
                    None => break,
                },
                _ = shutdown.changed() => {
                    info!("correlator shutting down");
                    break;
                }
            }
        }
    }
}
