//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the room registry together with the random generator used for
//! codes, item IDs and note placement, plus the hub that fans frames out to
//! connections. Rooms live only in memory; nothing survives a restart.
//!
//! Registry and generator sit behind one async mutex. Every inbound event
//! holds it from read through mutate to broadcast, so events are applied one
//! at a time across all rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::services::hub::Hub;
use crate::services::registry::RoomRegistry;

/// Short human-shareable room identifier.
pub type RoomCode = String;

/// Opaque server-generated item identifier.
pub type ItemId = String;

/// One live websocket connection.
pub type ConnId = Uuid;

// =============================================================================
// ITEM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Answer,
    Title,
}

/// A placed object on the board. Serialized as-is in `newItem` and `state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub text: String,
    /// Author name. Answers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub bg: String,
    pub color: String,
    pub border_color: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Stacking order. Bumped on every move.
    pub z: u64,
}

// =============================================================================
// STYLE / PREFS
// =============================================================================

pub const DEFAULT_BOARD_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_TITLE_BACKGROUND: &str = "#FFEB3B";
pub const DEFAULT_TITLE_TEXT_COLOR: &str = "#000000";

/// Shared visual theme of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStyle {
    pub board_background: String,
    pub title_background: String,
    pub title_text_color: String,
}

impl Default for RoomStyle {
    fn default() -> Self {
        Self {
            board_background: DEFAULT_BOARD_BACKGROUND.into(),
            title_background: DEFAULT_TITLE_BACKGROUND.into(),
            title_text_color: DEFAULT_TITLE_TEXT_COLOR.into(),
        }
    }
}

/// Partial style update. Absent fields keep their current value.
/// Accepts the short legacy key names older clients send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    #[serde(default, alias = "boardBg")]
    pub board_background: Option<String>,
    #[serde(default, alias = "titleBg")]
    pub title_background: Option<String>,
    #[serde(default, alias = "titleColor")]
    pub title_text_color: Option<String>,
}

/// Shared display preferences of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPrefs {
    pub show_names_on_board: bool,
}

impl Default for BoardPrefs {
    fn default() -> Self {
        Self { show_names_on_board: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefsPatch {
    #[serde(default)]
    pub show_names_on_board: Option<bool>,
}

// =============================================================================
// ROOM SESSION
// =============================================================================

/// Live state of one whiteboard. Mutated only by the session handlers.
#[derive(Debug, Clone)]
pub struct RoomSession {
    pub question: String,
    pub items: HashMap<ItemId, Item>,
    pub style: RoomStyle,
    pub prefs: BoardPrefs,
    /// Last time an event touched this room. Drives idle eviction.
    pub last_active: Instant,
}

impl RoomSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            question: String::new(),
            items: HashMap::new(),
            style: RoomStyle::default(),
            prefs: BoardPrefs::default(),
            last_active: Instant::now(),
        }
    }
}

impl Default for RoomSession {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ROOMS
// =============================================================================

/// Registry plus the random source handed to every mutator.
pub struct Rooms {
    pub registry: RoomRegistry,
    pub rng: StdRng,
}

impl Rooms {
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self { registry: RoomRegistry::new(), rng }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<Mutex<Rooms>>,
    pub hub: Arc<Hub>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rooms: Arc::new(Mutex::new(Rooms::new(rng))),
            hub: Arc::new(Hub::new()),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
