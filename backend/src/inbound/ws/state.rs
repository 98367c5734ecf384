//! Shared WebSocket adapter state.
//!
//! The registry doubles as the process-wide [`NotificationRelay`]: services
//! publish through the port and every open socket receives the frame.

use std::collections::HashMap;
use std::sync::Arc;

use actix_ws::Session;
use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::Notification;
use crate::domain::ports::NotificationRelay;
use crate::inbound::ws::messages::BroadcastFrame;

/// Open WebSocket connections keyed by connection id.
pub struct WsRegistry {
    connections: Mutex<HashMap<Uuid, Session>>,
    clock: Arc<dyn Clock>,
}

impl WsRegistry {
    /// Empty registry stamping outgoing frames with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Track a freshly upgraded connection and return its id.
    pub async fn register(&self, session: Session) -> Uuid {
        let id = Uuid::new_v4();
        self.connections.lock().await.insert(id, session);
        debug!(connection = %id, "WebSocket client connected");
        id
    }

    /// Forget a connection; unknown ids are ignored.
    pub async fn unregister(&self, id: Uuid) {
        if self.connections.lock().await.remove(&id).is_some() {
            debug!(connection = %id, "WebSocket client disconnected");
        }
    }

    /// Number of open connections.
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Whether no connection is open.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl NotificationRelay for WsRegistry {
    async fn broadcast(&self, notification: Notification) {
        let frame = BroadcastFrame::new(&notification, self.clock.utc());
        let body = match serde_json::to_string(&frame) {
            Ok(body) => body,
            Err(error) => {
                warn!(error = %error, "Failed to serialise broadcast frame");
                return;
            }
        };

        // Sends happen outside the lock so a slow client cannot stall registration.
        let targets: Vec<(Uuid, Session)> = self
            .connections
            .lock()
            .await
            .iter()
            .map(|(id, session)| (*id, session.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, mut session) in targets {
            if session.text(body.clone()).await.is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.lock().await;
            for id in dead {
                connections.remove(&id);
                debug!(connection = %id, "Dropped WebSocket client after failed send");
            }
        }
    }
}

/// Dependency bundle for the `/ws` handler.
#[derive(Clone)]
pub struct WsState {
    pub registry: Arc<WsRegistry>,
    pub frontend_origin: Option<Url>,
}

impl WsState {
    /// Construct state from the shared registry and the configured frontend origin.
    pub fn new(registry: Arc<WsRegistry>, frontend_origin: Option<Url>) -> Self {
        Self {
            registry,
            frontend_origin,
        }
    }
}
