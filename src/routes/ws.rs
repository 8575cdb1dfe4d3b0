//! WebSocket handler — bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, registers an outbound channel with
//! the hub and enters a `select!` loop:
//! - Incoming client frames → parse → session dispatch under the room lock
//! - Frames pushed by the hub (broadcasts, snapshots) → forward to client
//!
//! The session layer never touches the socket; it only pushes into the
//! hub. This task is the single writer for its socket, so frames reach the
//! client in the order the hub accepted them.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register with hub → send `session:connected`
//! 2. Client sends event frames → `services::session::handle_frame`
//! 3. Close → hub drops the connection from every room group

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::session;
use crate::state::{AppState, ConnId};

pub const EVENT_CONNECTED: &str = "session:connected";

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn = Uuid::new_v4();

    // Per-connection channel for frames the hub routes to this client.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.client_channel_capacity);
    state.hub.register(conn, client_tx);

    let welcome = Frame::new(EVENT_CONNECTED, Data::new()).with_data("connectionId", conn.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        state.hub.disconnect(conn);
        return;
    }

    info!(%conn, clients = state.hub.connection_count(), "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => process_inbound_text(&state, conn, text.as_str()).await,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    let rooms = state.hub.disconnect(conn);
    info!(%conn, rooms = ?rooms, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse one inbound text frame and apply it. Malformed input is logged and
/// dropped; nothing is ever sent back as an error.
async fn process_inbound_text(state: &AppState, conn: ConnId, text: &str) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(%conn, error = %e, "ws: invalid inbound frame");
            return;
        }
    };

    debug!(%conn, id = %frame.id, event = %frame.event, room = ?frame.room_code(), "ws: recv frame");

    let mut rooms = state.rooms.lock().await;
    session::handle_frame(&mut rooms, state.hub.as_ref(), conn, &frame);
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    debug!(id = %frame.id, event = %frame.event, room = ?frame.room, "ws: send frame");
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
