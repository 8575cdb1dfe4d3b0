//! Room session mutators — question, answers, titles, move, resize, style.
//!
//! DESIGN
//! ======
//! Each mutator validates and normalizes its input, applies the change in
//! place and returns what the caller needs to broadcast. Mutations are last
//! write wins with no versioning; the only ordering concern is visual
//! stacking, handled by bumping the item's own `z` on every move.
//!
//! Randomness (item IDs, note placement) always comes from the generator the
//! caller passes in, so a seeded generator makes every result reproducible.

use std::fmt::Write;
use std::ops::Range;
use std::time::Instant;

use rand::Rng;
use serde::Serialize;

use crate::state::{BoardPrefs, Item, ItemId, ItemKind, PrefsPatch, RoomSession, RoomStyle, StylePatch};

// =============================================================================
// LIMITS
// =============================================================================

pub const CANVAS_MIN: i32 = 0;
pub const CANVAS_MAX: i32 = 2000;

pub const MIN_ITEM_SIZE: u32 = 20;
pub const MAX_ITEM_SIZE: u32 = 2000;

pub const MAX_QUESTION_CHARS: usize = 500;
pub const MAX_NAME_CHARS: usize = 40;
pub const MAX_ANSWER_CHARS: usize = 280;
pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_COLOR_CHARS: usize = 32;

pub const ANSWER_WIDTH: u32 = 280;
pub const ANSWER_HEIGHT: u32 = 100;
pub const TITLE_WIDTH: u32 = 320;
pub const TITLE_HEIGHT: u32 = 80;

/// New answers land somewhere in this band, below the title row.
pub const ANSWER_SPAWN_X: Range<i32> = 0..400;
pub const ANSWER_SPAWN_Y: Range<i32> = 120..420;
pub const TITLE_ORIGIN: (i32, i32) = (20, 80);

pub const DEFAULT_ANSWER_BG: &str = "#FFEB3B";
pub const DEFAULT_ANSWER_COLOR: &str = "#000000";
pub const DEFAULT_BORDER_COLOR: &str = "#000000";

const ITEM_ID_BYTES: usize = 6;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

/// Raw answer fields as received from a participant.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerInput<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub bg: Option<&'a str>,
    pub color: Option<&'a str>,
    pub border_color: Option<&'a str>,
}

/// Full board state as delivered to a joining connection.
#[derive(Debug, Serialize)]
pub struct RoomSnapshot<'a> {
    pub question: &'a str,
    pub items: Vec<&'a Item>,
    pub style: &'a RoomStyle,
    pub prefs: &'a BoardPrefs,
}

// =============================================================================
// MUTATORS
// =============================================================================

impl RoomSession {
    /// Record activity for idle eviction.
    pub fn touch(&mut self, now: Instant) {
        self.last_active = now;
    }

    /// Replace the question and clear the board. Returns the stored text.
    pub fn set_question(&mut self, raw: &str) -> &str {
        self.question = clip(raw, MAX_QUESTION_CHARS);
        self.items.clear();
        &self.question
    }

    /// Place a new answer note at a random spot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `name` or `text` is blank after trimming.
    pub fn submit_answer(&mut self, input: &AnswerInput<'_>, rng: &mut impl Rng) -> Result<&Item, RoomError> {
        let name = clip(input.name, MAX_NAME_CHARS);
        if name.is_empty() {
            return Err(RoomError::InvalidInput("name required"));
        }
        let text = clip(input.text, MAX_ANSWER_CHARS);
        if text.is_empty() {
            return Err(RoomError::InvalidInput("text required"));
        }

        let id = self.next_item_id(rng);
        let item = Item {
            id: id.clone(),
            kind: ItemKind::Answer,
            text,
            name: Some(name),
            bg: color_or(input.bg, DEFAULT_ANSWER_BG),
            color: color_or(input.color, DEFAULT_ANSWER_COLOR),
            border_color: color_or(input.border_color, DEFAULT_BORDER_COLOR),
            x: rng.random_range(ANSWER_SPAWN_X),
            y: rng.random_range(ANSWER_SPAWN_Y),
            width: ANSWER_WIDTH,
            height: ANSWER_HEIGHT,
            z: 1,
        };
        Ok(&*self.items.entry(id).or_insert(item))
    }

    /// Place a title heading. Colors come from the room style at creation time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `text` is blank after trimming.
    pub fn add_title(&mut self, raw: &str, rng: &mut impl Rng) -> Result<&Item, RoomError> {
        let text = clip(raw, MAX_TITLE_CHARS);
        if text.is_empty() {
            return Err(RoomError::InvalidInput("text required"));
        }

        let id = self.next_item_id(rng);
        let (x, y) = TITLE_ORIGIN;
        let item = Item {
            id: id.clone(),
            kind: ItemKind::Title,
            text,
            name: None,
            bg: self.style.title_background.clone(),
            color: self.style.title_text_color.clone(),
            border_color: DEFAULT_BORDER_COLOR.into(),
            x,
            y,
            width: TITLE_WIDTH,
            height: TITLE_HEIGHT,
            z: 1,
        };
        Ok(&*self.items.entry(id).or_insert(item))
    }

    /// Move an item, clamped to the canvas, and lift it to the top.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if no item has `id`.
    pub fn move_item(&mut self, id: &str, x: f64, y: f64) -> Result<&Item, RoomError> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| RoomError::ItemNotFound(id.to_owned()))?;
        item.x = clamp_coord(x);
        item.y = clamp_coord(y);
        item.z = item.z.saturating_add(1);
        Ok(&*item)
    }

    /// Resize an item, clamped to sane bounds.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if no item has `id`.
    pub fn resize_item(&mut self, id: &str, width: f64, height: f64) -> Result<&Item, RoomError> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| RoomError::ItemNotFound(id.to_owned()))?;
        item.width = clamp_size(width);
        item.height = clamp_size(height);
        Ok(&*item)
    }

    /// Shallow-merge supplied style fields. Blank values are ignored.
    pub fn merge_style(&mut self, patch: StylePatch) -> &RoomStyle {
        merge_color(&mut self.style.board_background, patch.board_background.as_deref());
        merge_color(&mut self.style.title_background, patch.title_background.as_deref());
        merge_color(&mut self.style.title_text_color, patch.title_text_color.as_deref());
        &self.style
    }

    /// Shallow-merge supplied preference fields.
    pub fn merge_prefs(&mut self, patch: PrefsPatch) -> &BoardPrefs {
        if let Some(show) = patch.show_names_on_board {
            self.prefs.show_names_on_board = show;
        }
        &self.prefs
    }

    /// Current state for a joining connection. Items ordered bottom to top.
    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot<'_> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by(|a, b| a.z.cmp(&b.z).then_with(|| a.id.cmp(&b.id)));
        RoomSnapshot { question: &self.question, items, style: &self.style, prefs: &self.prefs }
    }

    fn next_item_id(&self, rng: &mut impl Rng) -> ItemId {
        loop {
            let bytes: [u8; ITEM_ID_BYTES] = rng.random();
            let id = bytes_to_hex(&bytes);
            if !self.items.contains_key(&id) {
                return id;
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Trim and cap to `max` characters without splitting a character.
#[must_use]
pub fn clip(raw: &str, max: usize) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(max) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_owned(),
        None => trimmed.to_owned(),
    }
}

fn color_or(raw: Option<&str>, default: &str) -> String {
    raw.map(|v| clip(v, MAX_COLOR_CHARS))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn merge_color(slot: &mut String, raw: Option<&str>) {
    let Some(value) = raw.map(|v| clip(v, MAX_COLOR_CHARS)) else {
        return;
    };
    if !value.is_empty() {
        *slot = value;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_coord(v: f64) -> i32 {
    v.round().clamp(f64::from(CANVAS_MIN), f64::from(CANVAS_MAX)) as i32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_size(v: f64) -> u32 {
    v.round().clamp(f64::from(MIN_ITEM_SIZE), f64::from(MAX_ITEM_SIZE)) as u32
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
