//! Room registry — code minting, get-or-create, idle eviction.
//!
//! DESIGN
//! ======
//! One owned map from room code to `RoomSession`. The registry is handed to
//! handlers explicitly (it lives in `AppState`), never reached through a
//! global. Codes are four symbols from a 32-symbol alphabet without the
//! look-alikes `0 O 1 I`, so about a million codes exist and collisions at
//! mint time are resolved by drawing again.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::state::{RoomCode, RoomSession};

pub const ROOM_CODE_LEN: usize = 4;
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Longest code accepted from a client for an out-of-band join.
pub const MAX_ROOM_CODE_LEN: usize = 32;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomSession>,
}

impl RoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh room code and register a default session under it.
    pub fn mint(&mut self, rng: &mut impl Rng) -> RoomCode {
        let code = loop {
            let candidate = generate_room_code(rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(code.clone(), RoomSession::new());
        code
    }

    /// Return the session for `code`, creating a default one if absent.
    pub fn ensure(&mut self, code: &str) -> &mut RoomSession {
        self.rooms.entry(code.to_owned()).or_default()
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut RoomSession> {
        self.rooms.get_mut(code)
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&RoomSession> {
        self.rooms.get(code)
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Remove rooms idle for at least `ttl` that `is_occupied` reports as
    /// having no subscribers. Returns the evicted codes.
    pub fn evict_idle(&mut self, now: Instant, ttl: Duration, is_occupied: impl Fn(&str) -> bool) -> Vec<RoomCode> {
        let mut evicted = Vec::new();
        self.rooms.retain(|code, session| {
            let idle = now.saturating_duration_since(session.last_active);
            if idle >= ttl && !is_occupied(code) {
                evicted.push(code.clone());
                false
            } else {
                true
            }
        });
        evicted
    }
}

/// Draw a random room code. Uniqueness is the caller's concern.
pub fn generate_room_code(rng: &mut impl Rng) -> RoomCode {
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalize a client-supplied room code: trim, uppercase, reject empty or
/// oversized input.
#[must_use]
pub fn normalize_room_code(raw: &str) -> Option<RoomCode> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_ROOM_CODE_LEN {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
