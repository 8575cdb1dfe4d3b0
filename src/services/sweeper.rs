//! Idle room sweeper — background eviction of abandoned rooms.
//!
//! DESIGN
//! ======
//! Rooms live only in memory and nothing else ever removes them. Every
//! `room_sweep_interval` the sweeper drops rooms that have no subscribed
//! connections and have seen no event for `room_idle_ttl`. A room that is
//! evicted and later joined again by code simply starts fresh.

use std::time::Instant;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::state::AppState;

/// Spawn the background sweeper. Returns `None` when eviction is disabled.
pub fn spawn_idle_sweeper(state: AppState) -> Option<JoinHandle<()>> {
    let ttl = state.config.room_idle_ttl?;
    let period = state.config.room_sweep_interval;
    info!(ttl_secs = ttl.as_secs(), period_secs = period.as_secs(), "idle room sweeper configured");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(&state, Instant::now()).await;
        }
    }))
}

/// Run one eviction pass. Returns the number of rooms removed.
pub async fn sweep_once(state: &AppState, now: Instant) -> usize {
    let Some(ttl) = state.config.room_idle_ttl else {
        return 0;
    };
    let mut rooms = state.rooms.lock().await;
    let evicted = rooms
        .registry
        .evict_idle(now, ttl, |code| state.hub.subscriber_count(code) > 0);
    if !evicted.is_empty() {
        info!(count = evicted.len(), remaining = rooms.registry.len(), rooms = ?evicted, "evicted idle rooms");
    }
    evicted.len()
}
