//! Docker events subscription.
//!
//! `EventSource` owns the connection to the local Docker daemon and
//! turns its raw event feed into a channel of [`SourceSignal`]s. The
//! pump runs as a spawned task; backpressure from a slow consumer is
//! absorbed by the channel.

use std::collections::HashMap;

use bollard::Docker;
use bollard::models::EventMessage;
use bollard::query_parameters::EventsOptions;
use futures_util::{Stream, StreamExt, pin_mut};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use foundry_core::ContainerEvent;
use foundry_core::labels::MANAGED_BY_LABEL;

use crate::convert;

/// Result type alias for event source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while setting up the event source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to connect to the container runtime: {0}")]
    Connect(String),
}

/// One item on the subscription channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSignal {
    /// A decoded container lifecycle notification.
    Event(ContainerEvent),
    /// The feed ended cleanly.
    Closed,
    /// The feed failed; the message describes the transport error.
    Errored(String),
}

/// Subscription to the Docker daemon's container lifecycle events.
pub struct EventSource {
    docker: Docker,
    managed_value: String,
}

impl EventSource {
    /// Connect to the local Docker daemon.
    ///
    /// `managed_value` is the `created-by` label value the subscription
    /// filters on, so only containers this system manages are observed.
    pub fn connect(managed_value: impl Into<String>) -> SourceResult<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| SourceError::Connect(e.to_string()))?;
        Ok(Self {
            docker,
            managed_value: managed_value.into(),
        })
    }

    /// Subscribe to the filtered event feed.
    ///
    /// Spawns the pump task and returns the receiving end. The channel
    /// carries a terminal [`SourceSignal::Closed`] or
    /// [`SourceSignal::Errored`] before the sender is dropped.
    pub fn subscribe(&self) -> mpsc::Receiver<SourceSignal> {
        let (tx, rx) = mpsc::channel(64);

        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        filters.insert(
            "label".to_string(),
            vec![format!("{MANAGED_BY_LABEL}={}", self.managed_value)],
        );
        let options = EventsOptions {
            filters: Some(filters),
            ..Default::default()
        };

        let docker = self.docker.clone();
        tokio::spawn(async move {
            let stream = docker.events(Some(options));
            pump(stream, tx).await;
        });

        rx
    }
}

/// Drain the raw feed into the channel until it ends or fails.
async fn pump(
    stream: impl Stream<Item = Result<EventMessage, bollard::errors::Error>>,
    tx: mpsc::Sender<SourceSignal>,
) {
    pin_mut!(stream);

    while let Some(item) = stream.next().await {
        match item {
            Ok(msg) => {
                let Some(event) = convert::notification_from(msg) else {
                    warn!("dropping event frame without an action");
                    continue;
                };
                if tx.send(SourceSignal::Event(event)).await.is_err() {
                    // Receiver gone; the daemon is shutting down.
                    return;
                }
            }
            Err(e) if is_decode_error(&e) => {
                warn!(error = %e, "dropping malformed event frame");
            }
            Err(e) => {
                error!(error = %e, "event stream failed");
                let _ = tx.send(SourceSignal::Errored(e.to_string())).await;
                return;
            }
        }
    }

    info!("event stream closed");
    let _ = tx.send(SourceSignal::Closed).await;
}

/// Frame-level decode failures are dropped; anything else ends the feed.
fn is_decode_error(e: &bollard::errors::Error) -> bool {
    matches!(
        e,
        bollard::errors::Error::JsonDataError { .. }
            | bollard::errors::Error::JsonSerdeError { .. }
    )
}
