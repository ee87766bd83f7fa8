use crate::state::ServerState;
use cobble_protocol_core::{ProtocolResult, Session, SessionHooks};
use cobble_types::{BlockAction, BlockId, Orientation, Position, SELF_ID};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_NAME_LENGTH: usize = 16;

/// Server side of every session: identity checks, level edits and broadcasts.
pub struct ServerHooks {
    state: Arc<ServerState>,
}

impl ServerHooks {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Chat to every player.
    fn broadcast_chat(&self, text: &str) {
        for player in self.state.players() {
            report(&player, player.send_chat(text));
        }
    }
}

/// Player names as the legacy clients allow them.
pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Log a failed send. The session has already been torn down if the transport failed.
fn report(session: &Session, result: ProtocolResult<()>) {
    if let Err(e) = result {
        debug!("Send to {} failed: {}", session.name(), e);
    }
}

impl SessionHooks for ServerHooks {
    fn process_login(&self, session: &Session, name: &str) -> Result<(), String> {
        if !valid_name(name) {
            return Err("Invalid player name!".into());
        }
        let id = self.state.add_player(session.id(), name)?;
        if !session.set_entity_id(id) {
            self.state.remove_player(id, session.id());
            return Err("Already logged in!".into());
        }
        debug!("{} assigned entity id {}", name, id);
        Ok(())
    }

    fn complete_login(&self, session: &Session) {
        let config = &self.state.config;
        let Some(id) = session.entity_id() else {
            warn!("Session {} completed login without an entity id", session.id());
            return;
        };
        let name = session.name();

        if let Err(e) = session.send_motd(&config.server_name, &config.motd) {
            report(session, Err(e));
        }
        let level = Arc::new(self.state.level_snapshot());
        let (spawn, spawn_rot) = (level.spawn, level.spawn_orientation);
        report(session, session.send_level(level));
        session.set_transform(spawn, spawn_rot);
        report(session, session.send_teleport(SELF_ID, spawn, spawn_rot));

        // Existing players see the newcomer and the newcomer sees them
        for other in self.state.players() {
            let Some(other_id) = other.entity_id() else {
                continue;
            };
            if other_id == id || !other.is_active() {
                continue;
            }
            let other_name = other.name();
            report(
                session,
                session.send_spawn_entity(
                    other_id,
                    &other_name,
                    &other_name,
                    other.position(),
                    other.orientation(),
                ),
            );
            report(&other, other.send_spawn_entity(id, &name, &name, spawn, spawn_rot));
        }

        info!("{} joined ({} online)", name, self.state.player_count());
        self.broadcast_chat(&format!("&e{} joined the game", name));
    }

    fn process_movement(&self, session: &Session, position: Position, orientation: Orientation) {
        // Other players pick this up on the next sync pass
        tracing::trace!(
            "{} at ({}, {}, {}) facing {}/{}",
            session.name(),
            position.x,
            position.y,
            position.z,
            orientation.rot_y,
            orientation.head_x
        );
    }

    fn process_block_change(
        &self,
        session: &Session,
        x: u16,
        y: u16,
        z: u16,
        action: BlockAction,
        block: BlockId,
    ) {
        if !self.state.level_in_bounds(x, y, z) {
            debug!("{} edited outside the level at ({}, {}, {})", session.name(), x, y, z);
            return;
        }
        match self.state.edit_level(x, y, z, action, block) {
            Some(new) => {
                for player in self.state.players() {
                    report(&player, player.send_block_change(x, y, z, new));
                }
            }
            None => {
                // Undo whatever the client predicted
                let current = self.state.level_block(x, y, z);
                report(session, session.send_block_change(x, y, z, current));
            }
        }
    }

    fn process_chat(&self, session: &Session, text: &str) {
        let name = session.name();
        info!("<{}> {}", name, text);
        self.broadcast_chat(&format!("&7{}: &f{}", name, text));
    }

    fn disconnected(&self, session: &Session, reason: &str) {
        self.state.remove_connection(session.id());
        let Some(id) = session.entity_id() else {
            return;
        };
        if !self.state.remove_player(id, session.id()) {
            return;
        }

        let name = session.name();
        for other in self.state.players() {
            report(&other, other.send_remove_entity(id));
        }
        info!("{} left ({})", name, reason);
        self.broadcast_chat(&format!("&e{} left the game", name));
    }
}
