//! Hub — per-room pub/sub groups over per-connection channels.
//!
//! DESIGN
//! ======
//! The session handlers only see the narrow `Transport` trait: join a
//! connection to a room group, broadcast to a group, unicast to one
//! connection. `Hub` is the production implementation. Each websocket task
//! registers an mpsc sender and drains the receiver onto its socket, so
//! per-connection delivery order is the order frames were pushed here.
//!
//! Delivery is fire-and-forget: `try_send` never waits. A full or closed
//! channel drops that one frame for that one connection.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::frame::Frame;
use crate::state::ConnId;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Outbound messaging primitive used by the session handlers.
pub trait Transport: Send + Sync {
    /// Subscribe `conn` to the broadcast group for `room`. Idempotent.
    fn join(&self, room: &str, conn: ConnId);

    /// Deliver `frame` to every connection subscribed to `room`.
    fn broadcast(&self, room: &str, frame: &Frame);

    /// Deliver `frame` to a single connection.
    fn unicast(&self, conn: ConnId, frame: &Frame);
}

// =============================================================================
// HUB
// =============================================================================

#[derive(Default)]
pub struct Hub {
    inner: Mutex<HubInner>,
}

#[derive(Default)]
struct HubInner {
    /// Live connections and their outbound channels.
    connections: HashMap<ConnId, mpsc::Sender<Frame>>,
    /// Room code -> subscribed connections.
    groups: HashMap<String, HashSet<ConnId>>,
}

impl Hub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection's outbound channel. Must precede `join`.
    pub fn register(&self, conn: ConnId, tx: mpsc::Sender<Frame>) {
        self.lock().connections.insert(conn, tx);
    }

    /// Drop a connection and remove it from every group it joined.
    /// Returns the rooms it was subscribed to.
    pub fn disconnect(&self, conn: ConnId) -> Vec<String> {
        let mut inner = self.lock();
        inner.connections.remove(&conn);
        let mut left = Vec::new();
        inner.groups.retain(|room, members| {
            if members.remove(&conn) {
                left.push(room.clone());
            }
            !members.is_empty()
        });
        left
    }

    /// Number of connections currently subscribed to `room`.
    #[must_use]
    pub fn subscriber_count(&self, room: &str) -> usize {
        self.lock().groups.get(room).map_or(0, HashSet::len)
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }
}

impl Transport for Hub {
    fn join(&self, room: &str, conn: ConnId) {
        let mut inner = self.lock();
        if !inner.connections.contains_key(&conn) {
            debug!(room, %conn, "hub: join from unregistered connection ignored");
            return;
        }
        inner.groups.entry(room.to_owned()).or_default().insert(conn);
    }

    fn broadcast(&self, room: &str, frame: &Frame) {
        let inner = self.lock();
        let Some(members) = inner.groups.get(room) else {
            return;
        };
        for conn in members {
            if let Some(tx) = inner.connections.get(conn) {
                deliver(*conn, tx, frame);
            }
        }
    }

    fn unicast(&self, conn: ConnId, frame: &Frame) {
        let inner = self.lock();
        if let Some(tx) = inner.connections.get(&conn) {
            deliver(conn, tx, frame);
        }
    }
}

/// Best-effort: if a client's channel is full or closed, skip it.
fn deliver(conn: ConnId, tx: &mpsc::Sender<Frame>, frame: &Frame) {
    if let Err(e) = tx.try_send(frame.clone()) {
        debug!(%conn, event = %frame.event, error = %e, "hub: dropped frame");
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
