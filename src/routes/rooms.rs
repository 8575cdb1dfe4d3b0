//! Room minting endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::info;

use crate::state::{AppState, RoomCode, Rooms};

#[derive(Debug, Serialize)]
pub struct NewRoomResponse {
    pub room: RoomCode,
}

/// `GET /api/new-room` — mint a fresh room and return its code.
pub async fn new_room(State(state): State<AppState>) -> Json<NewRoomResponse> {
    let mut rooms = state.rooms.lock().await;
    let Rooms { registry, rng } = &mut *rooms;
    let room = registry.mint(rng);
    info!(%room, total = registry.len(), "room minted");
    Json(NewRoomResponse { room })
}
