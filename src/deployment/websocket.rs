//! WebSocket Handler for Pool Status Updates
//!
//! Provides real-time lifecycle updates to connected clients.
//! Uses tokio broadcast channels for pub/sub. Delivery is best effort:
//! a slow or absent subscriber never blocks the state machine.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::types::pool::{PoolRecord, PoolStatusUpdate};

/// WebSocket state shared across handlers
pub struct WebSocketState {
    /// Broadcast sender for status updates
    sender: broadcast::Sender<PoolStatusUpdate>,
}

impl WebSocketState {
    /// Create new WebSocket state with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to updates
    pub fn subscribe(&self) -> broadcast::Receiver<PoolStatusUpdate> {
        self.sender.subscribe()
    }

    /// Publish an update to all subscribers
    pub fn publish(&self, update: PoolStatusUpdate) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(update);
    }
}

impl Default for WebSocketState {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Shared WebSocket state type
pub type SharedWebSocketState = Arc<RwLock<WebSocketState>>;

/// Create shared WebSocket state
pub fn create_ws_state() -> SharedWebSocketState {
    Arc::new(RwLock::new(WebSocketState::default()))
}

/// WebSocket upgrade handler for a specific pool
///
/// Route: /ws/pools/:id
pub async fn ws_pool_handler(
    ws: WebSocketUpgrade,
    Path(pool_id): Path<String>,
    State(state): State<SharedWebSocketState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, Some(pool_id), state))
}

/// WebSocket upgrade handler for all pool updates
///
/// Route: /ws/pools
/// Receives updates for every pool (useful for admin dashboards)
pub async fn ws_all_pools_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedWebSocketState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, None, state))
}

/// Handle an individual WebSocket connection. `filter` limits the
/// stream to one pool; `None` forwards everything.
async fn handle_socket(socket: WebSocket, filter: Option<String>, state: SharedWebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to updates
    let ws_state = state.read().await;
    let mut rx = ws_state.subscribe();
    drop(ws_state);

    // Forward matching updates to this client
    let send_task = tokio::spawn(async move {
        while let Ok(update) = rx.recv().await {
            if let Some(ref pool_id) = filter {
                if &update.pool_id != pool_id {
                    continue;
                }
            }

            let json = match serde_json::to_string(&update) {
                Ok(j) => j,
                Err(_) => continue,
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (ping/pong, close)
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
}

/// Publisher for broadcasting pool updates
#[derive(Clone)]
pub struct PoolUpdatePublisher {
    state: SharedWebSocketState,
}

impl PoolUpdatePublisher {
    /// Create a new publisher
    pub fn new(state: SharedWebSocketState) -> Self {
        Self { state }
    }

    /// Publish a pool status update
    pub async fn publish(&self, update: PoolStatusUpdate) {
        let ws_state = self.state.read().await;
        ws_state.publish(update);
    }

    /// Publish the current status of a pool record
    pub async fn publish_pool_status(&self, record: &PoolRecord) {
        self.publish(PoolStatusUpdate::from(record)).await;
    }
}
