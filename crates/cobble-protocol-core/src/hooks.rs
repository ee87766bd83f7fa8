use crate::session::Session;
use cobble_types::{BlockAction, BlockId, Orientation, Position};

/// Game-side collaborators a session drives. Implemented by the server.
///
/// Calls for one session arrive from its decode loop in packet order; calls for
/// different sessions may run concurrently.
pub trait SessionHooks: Send + Sync {
    /// Validate identity. Returning `Err` rejects the login with that reason.
    fn process_login(&self, session: &Session, name: &str) -> Result<(), String>;

    /// The session is ready for play: send the level, spawn the player.
    fn complete_login(&self, session: &Session);

    /// The player moved. The session has already recorded the new transform.
    fn process_movement(&self, session: &Session, position: Position, orientation: Orientation);

    fn process_block_change(
        &self,
        session: &Session,
        x: u16,
        y: u16,
        z: u16,
        action: BlockAction,
        block: BlockId,
    );

    fn process_chat(&self, session: &Session, text: &str);

    /// The session entered its terminal state.
    fn disconnected(&self, session: &Session, reason: &str);
}
