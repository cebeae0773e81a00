//! foundry-sink — WebSocket endpoint for dashboard subscribers.
//!
//! Accepts persistent connections on `/ws` and logs whatever the
//! subscriber sends. Broadcasting build-state changes out to subscribers
//! is a future extension point; today the sink only has to accept
//! inbound traffic without falling over.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

/// WebSocket server for build-state subscribers.
pub struct NotificationSink {
    bind_addr: SocketAddr,
}

impl NotificationSink {
    /// Create a sink bound to the given address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }

    /// The sink's router, exposed separately for tests.
    pub fn router() -> Router {
        Router::new().route("/ws", get(ws_upgrade))
    }

    /// Serve subscriber connections until the shutdown signal fires.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "notification sink listening");

        axum::serve(listener, Self::router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
                info!("notification sink shutting down");
            })
            .await?;

        Ok(())
    }
}

async fn ws_upgrade(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_subscriber)
}

async fn handle_subscriber(mut socket: WebSocket) {
    debug!("subscriber connected");

    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => debug!(%text, "received message"),
            Message::Binary(payload) => debug!(len = payload.len(), "received binary message"),
            Message::Close(_) => break,
            // Ping/pong is answered by axum itself.
            _ => {}
        }
    }

    debug!("subscriber disconnected");
}
