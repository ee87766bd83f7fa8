use crate::state::ServerState;
use cobble_protocol_core::sync::{update_positions, EntityView};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Keep-alive interval, in ticks.
const PING_INTERVAL_TICKS: u64 = 50;

/// The fixed-interval game loop: position sync and keep-alives.
pub async fn run_tick_loop(state: Arc<ServerState>, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_millis(state.config.tick_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick_count: u64 = 0;

    info!("Tick loop started ({} ms)", period.as_millis());

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                info!("Tick loop stopping");
                return;
            }
        }

        let tick_start = Instant::now();
        tick_count += 1;
        let sent = tick_positions(&state);
        if tick_count % PING_INTERVAL_TICKS == 0 {
            tick_keep_alive(&state);
        }

        let elapsed = tick_start.elapsed();
        if elapsed > period {
            warn!("Tick {} took {:?} ({} updates)", tick_count, elapsed, sent);
        }
    }
}

/// One sync pass: every active player hears about every other player that moved.
/// Returns the number of teleports sent.
pub fn tick_positions(state: &ServerState) -> usize {
    let players = state.players();
    let views: Vec<EntityView> = players
        .iter()
        .filter(|p| p.is_active())
        .filter_map(|p| {
            Some(EntityView {
                id: p.entity_id()?,
                position: p.position(),
                orientation: p.orientation(),
            })
        })
        .collect();

    let mut sent = 0;
    for player in &players {
        // Everyone shares the one level
        match update_positions(player, &views, |_| true) {
            Ok(n) => sent += n,
            Err(e) => debug!("Position sync to {} failed: {}", player.name(), e),
        }
    }
    sent
}

fn tick_keep_alive(state: &ServerState) {
    for player in state.players() {
        if let Err(e) = player.send_ping() {
            debug!("Keep-alive to {} failed: {}", player.name(), e);
        }
    }
}
