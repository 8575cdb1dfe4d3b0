//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room state and event semantics so route handlers can
//! stay focused on protocol translation. `session` applies inbound events
//! and reports what to send; `hub` is the only thing that knows about
//! connections.

pub mod hub;
pub mod registry;
pub mod room;
pub mod session;
pub mod sweeper;
