//! Room session event handlers.
//!
//! DESIGN
//! ======
//! Handler functions are pure business logic: they resolve the room,
//! validate, call the session mutator and return an `Outcome`. `dispatch`
//! owns all outbound concerns and applies the outcome through the
//! `Transport` trait, so nothing here knows about websockets.
//!
//! The caller holds the registry lock across `dispatch`, which makes every
//! event atomic: read, mutate and broadcast happen before the next event
//! for any room is looked at.
//!
//! ERROR HANDLING
//! ==============
//! Fail soft. Unknown rooms, unknown items and blank required fields turn
//! into an `EventError` that is logged and dropped. Nothing is sent back to
//! the originating client and no other connection is affected.

use std::time::Instant;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::frame::{Data, Frame};
use crate::services::hub::Transport;
use crate::services::registry::normalize_room_code;
use crate::services::room::{AnswerInput, RoomError};
use crate::state::{ConnId, PrefsPatch, RoomCode, RoomSession, Rooms, StylePatch};

// =============================================================================
// EVENT NAMES
// =============================================================================

pub const EVENT_JOIN_ROOM: &str = "joinRoom";
pub const EVENT_SET_QUESTION: &str = "setQuestion";
pub const EVENT_SUBMIT_ANSWER: &str = "submitAnswer";
pub const EVENT_ADD_TITLE: &str = "addTitle";
pub const EVENT_MOVE_ITEM: &str = "moveItem";
pub const EVENT_RESIZE_ITEM: &str = "resizeItem";
pub const EVENT_SET_ROOM_STYLE: &str = "setRoomStyle";
pub const EVENT_SET_BOARD_PREFS: &str = "setBoardPrefs";

pub const EVENT_STATE: &str = "state";
pub const EVENT_QUESTION: &str = "question";
pub const EVENT_CLEAR_ITEMS: &str = "clearItems";
pub const EVENT_NEW_ITEM: &str = "newItem";
pub const EVENT_ROOM_STYLE: &str = "roomStyle";
pub const EVENT_BOARD_PREFS: &str = "boardPrefs";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("missing or invalid room code")]
    InvalidRoomCode,
    #[error("room not found: {0}")]
    MissingRoom(RoomCode),
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("failed to encode payload: {0}")]
    Encode(serde_json::Error),
}

/// What a handler wants sent. `dispatch` performs the delivery.
#[derive(Debug)]
pub enum Outcome {
    /// Subscribe the sender to `room`, then send it `snapshot` alone.
    Join { room: RoomCode, snapshot: Frame },
    /// Deliver `frames`, in order, to every connection in `room`.
    Broadcast { room: RoomCode, frames: Vec<Frame> },
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Apply one inbound event. Errors are logged and swallowed.
pub fn handle_frame(rooms: &mut Rooms, transport: &dyn Transport, conn: ConnId, frame: &Frame) {
    if let Err(e) = dispatch(rooms, transport, conn, frame, Instant::now()) {
        debug!(%conn, event = %frame.event, error = %e, "session: event dropped");
    }
}

/// Apply one inbound event and deliver the result.
///
/// # Errors
///
/// Returns the reason the event was dropped. Nothing is sent in that case.
pub fn dispatch(
    rooms: &mut Rooms,
    transport: &dyn Transport,
    conn: ConnId,
    frame: &Frame,
    now: Instant,
) -> Result<(), EventError> {
    match handle_event(rooms, conn, frame, now)? {
        Outcome::Join { room, snapshot } => {
            transport.join(&room, conn);
            transport.unicast(conn, &snapshot);
        }
        Outcome::Broadcast { room, frames } => {
            for out in &frames {
                transport.broadcast(&room, out);
            }
        }
    }
    Ok(())
}

fn handle_event(rooms: &mut Rooms, conn: ConnId, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    match frame.event.as_str() {
        EVENT_JOIN_ROOM => handle_join(rooms, conn, frame, now),
        EVENT_SET_QUESTION => handle_set_question(rooms, frame, now),
        EVENT_SUBMIT_ANSWER => handle_submit_answer(rooms, frame, now),
        EVENT_ADD_TITLE => handle_add_title(rooms, frame, now),
        EVENT_MOVE_ITEM => handle_move_item(rooms, frame, now),
        EVENT_RESIZE_ITEM => handle_resize_item(rooms, frame, now),
        EVENT_SET_ROOM_STYLE => handle_set_room_style(rooms, frame, now),
        EVENT_SET_BOARD_PREFS => handle_set_board_prefs(rooms, frame, now),
        other => Err(EventError::UnknownEvent(other.to_owned())),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn handle_join(rooms: &mut Rooms, conn: ConnId, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let room = resolve_code(frame)?;
    let role = frame.str_field("role").unwrap_or("participant");

    let created = !rooms.registry.contains(&room);
    let session = rooms.registry.ensure(&room);
    session.touch(now);
    let snapshot = encode(EVENT_STATE, &room, &session.snapshot())?;

    info!(%room, %conn, role, created, items = session.items.len(), "session: joined room");
    Ok(Outcome::Join { room, snapshot })
}

fn handle_set_question(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let (room, session) = existing_session(rooms, frame, now)?;
    let raw = frame.str_field("question").unwrap_or_default();
    let cleared = session.items.len();
    let question = session.set_question(raw);

    info!(%room, cleared, "session: question set");
    let frames = vec![
        Frame::new(EVENT_QUESTION, Data::new())
            .with_data("question", question)
            .with_room(room.clone()),
        Frame::new(EVENT_CLEAR_ITEMS, Data::new()).with_room(room.clone()),
    ];
    Ok(Outcome::Broadcast { room, frames })
}

fn handle_submit_answer(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let Rooms { registry, rng } = rooms;
    let room = resolve_code(frame)?;
    let session = registry
        .get_mut(&room)
        .ok_or_else(|| EventError::MissingRoom(room.clone()))?;
    session.touch(now);

    let input = AnswerInput {
        name: frame.str_field("name").unwrap_or_default(),
        text: frame.str_field("text").unwrap_or_default(),
        bg: frame.str_field("bg"),
        color: frame.str_field("color"),
        border_color: frame.str_field("borderColor"),
    };
    let item = session.submit_answer(&input, rng)?;

    debug!(%room, id = %item.id, "session: answer submitted");
    let frames = vec![encode(EVENT_NEW_ITEM, &room, item)?];
    Ok(Outcome::Broadcast { room, frames })
}

fn handle_add_title(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let Rooms { registry, rng } = rooms;
    let room = resolve_code(frame)?;
    let session = registry
        .get_mut(&room)
        .ok_or_else(|| EventError::MissingRoom(room.clone()))?;
    session.touch(now);

    let item = session.add_title(frame.str_field("text").unwrap_or_default(), rng)?;

    debug!(%room, id = %item.id, "session: title added");
    let frames = vec![encode(EVENT_NEW_ITEM, &room, item)?];
    Ok(Outcome::Broadcast { room, frames })
}

fn handle_move_item(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let (room, session) = existing_session(rooms, frame, now)?;
    let id = frame.str_field("id").ok_or(EventError::InvalidInput("id required"))?;
    let (Some(x), Some(y)) = (frame.f64_field("x"), frame.f64_field("y")) else {
        return Err(EventError::InvalidInput("numeric x and y required"));
    };

    let item = session.move_item(id, x, y)?;
    let out = Frame::from_value(EVENT_MOVE_ITEM, json!({"id": item.id, "x": item.x, "y": item.y, "z": item.z}))
        .with_room(room.clone());
    Ok(Outcome::Broadcast { room, frames: vec![out] })
}

fn handle_resize_item(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let (room, session) = existing_session(rooms, frame, now)?;
    let id = frame.str_field("id").ok_or(EventError::InvalidInput("id required"))?;
    let (Some(width), Some(height)) = (frame.f64_field("width"), frame.f64_field("height")) else {
        return Err(EventError::InvalidInput("numeric width and height required"));
    };

    let item = session.resize_item(id, width, height)?;
    let out = Frame::from_value(
        EVENT_RESIZE_ITEM,
        json!({"id": item.id, "width": item.width, "height": item.height}),
    )
    .with_room(room.clone());
    Ok(Outcome::Broadcast { room, frames: vec![out] })
}

fn handle_set_room_style(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let (room, session) = existing_session(rooms, frame, now)?;
    let patch: StylePatch = decode_object(frame, "style")?;
    let style = session.merge_style(patch);

    info!(%room, "session: room style updated");
    let frames = vec![encode(EVENT_ROOM_STYLE, &room, style)?];
    Ok(Outcome::Broadcast { room, frames })
}

fn handle_set_board_prefs(rooms: &mut Rooms, frame: &Frame, now: Instant) -> Result<Outcome, EventError> {
    let (room, session) = existing_session(rooms, frame, now)?;
    let patch: PrefsPatch = decode_object(frame, "prefs")?;
    let prefs = session.merge_prefs(patch);

    info!(%room, show_names = prefs.show_names_on_board, "session: board prefs updated");
    let frames = vec![encode(EVENT_BOARD_PREFS, &room, prefs)?];
    Ok(Outcome::Broadcast { room, frames })
}

// =============================================================================
// HELPERS
// =============================================================================

fn resolve_code(frame: &Frame) -> Result<RoomCode, EventError> {
    frame
        .room_code()
        .and_then(normalize_room_code)
        .ok_or(EventError::InvalidRoomCode)
}

/// Look up the frame's room without creating it, and mark it active.
fn existing_session<'a>(
    rooms: &'a mut Rooms,
    frame: &Frame,
    now: Instant,
) -> Result<(RoomCode, &'a mut RoomSession), EventError> {
    let room = resolve_code(frame)?;
    let Some(session) = rooms.registry.get_mut(&room) else {
        return Err(EventError::MissingRoom(room));
    };
    session.touch(now);
    Ok((room, session))
}

/// Decode `data[key]` as a JSON object into a patch type.
fn decode_object<T: serde::de::DeserializeOwned>(frame: &Frame, key: &'static str) -> Result<T, EventError> {
    let Some(value) = frame.data.get(key).filter(|v| v.is_object()) else {
        return Err(EventError::InvalidInput(key));
    };
    serde_json::from_value(value.clone()).map_err(|_| EventError::InvalidInput(key))
}

fn encode(event: &str, room: &str, value: &impl Serialize) -> Result<Frame, EventError> {
    let value = serde_json::to_value(value).map_err(EventError::Encode)?;
    Ok(Frame::from_value(event, value).with_room(room))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
