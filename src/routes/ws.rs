//! WebSocket handler — snapshot stream.
//!
//! DESIGN
//! ======
//! On upgrade, the client subscribes to the store and immediately receives
//! the current snapshot. Every committed change then produces one more
//! snapshot frame. Clients send nothing meaningful; all commands go through
//! the HTTP routes. A slow client only ever sees the latest state, since the
//! `watch` channel keeps a single value.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → subscribe → send current snapshot
//! 2. Store publishes → send snapshot
//! 3. Close (either side) → drop subscription

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{AppState, HubState};

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let mut snapshots = state.store.subscribe();

    let current = snapshots.borrow_and_update().clone();
    if send_snapshot(&mut socket, &current).await.is_err() {
        return;
    }
    info!(%client_id, widgets = current.active_widgets().len(), "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                if matches!(msg, Message::Close(_)) {
                    break;
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if send_snapshot(&mut socket, &snapshot).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(%client_id, "ws: client disconnected");
}

/// JSON text of one snapshot frame.
pub(crate) fn snapshot_frame(state: &HubState) -> Option<String> {
    match serde_json::to_string(&json!({ "type": "snapshot", "state": state })) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize snapshot");
            None
        }
    }
}

async fn send_snapshot(socket: &mut WebSocket, state: &Arc<HubState>) -> Result<(), ()> {
    let Some(text) = snapshot_frame(state) else {
        return Err(());
    };
    socket.send(Message::Text(text.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
