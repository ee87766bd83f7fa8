use crate::config::ServerConfig;
use cobble_protocol_core::{LevelSnapshot, Session};
use cobble_types::{BlockAction, BlockId, EntityId, SELF_ID};
use cobble_world::Level;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared server state accessible from all connection tasks and the tick loop.
///
/// Accessors hand out clones so that no lock is held while packets are sent:
/// a failed send disconnects its session, which comes back here to unregister.
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    level: RwLock<Level>,
    next_session_id: AtomicU64,
    connections: RwLock<HashMap<u64, Arc<Session>>>,
    players: RwLock<BTreeMap<EntityId, Arc<Session>>>,
}

impl ServerState {
    pub fn new(config: Arc<ServerConfig>, level: Level) -> Self {
        Self {
            config,
            level: RwLock::new(level),
            next_session_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
            players: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    // === Connections ===

    pub fn add_connection(&self, session: Arc<Session>) {
        write(&self.connections).insert(session.id(), session);
    }

    pub fn remove_connection(&self, id: u64) -> Option<Arc<Session>> {
        write(&self.connections).remove(&id)
    }

    pub fn connection_count(&self) -> usize {
        read(&self.connections).len()
    }

    // === Players ===

    /// Register a connection as a player under the lowest free entity ID.
    pub fn add_player(&self, session_id: u64, name: &str) -> Result<EntityId, String> {
        let session = read(&self.connections)
            .get(&session_id)
            .cloned()
            .ok_or_else(|| "Connection closed".to_string())?;

        let mut players = write(&self.players);
        if players
            .values()
            .any(|p| p.name().eq_ignore_ascii_case(name))
        {
            return Err("Already logged in!".into());
        }
        if players.len() >= self.config.max_players {
            return Err("Server full!".into());
        }
        let id = (0..SELF_ID)
            .find(|id| !players.contains_key(id))
            .ok_or_else(|| "Server full!".to_string())?;
        players.insert(id, session);
        Ok(id)
    }

    /// Unregister entity `id` if it belongs to session `session_id`.
    pub fn remove_player(&self, id: EntityId, session_id: u64) -> bool {
        let mut players = write(&self.players);
        if players.get(&id).is_some_and(|p| p.id() == session_id) {
            players.remove(&id);
            true
        } else {
            false
        }
    }

    /// Every registered player, in entity ID order.
    pub fn players(&self) -> Vec<Arc<Session>> {
        read(&self.players).values().cloned().collect()
    }

    pub fn player_count(&self) -> usize {
        read(&self.players).len()
    }

    // === Level ===

    pub fn level_snapshot(&self) -> LevelSnapshot {
        read(&self.level).snapshot()
    }

    pub fn level_block(&self, x: u16, y: u16, z: u16) -> BlockId {
        read(&self.level).get_block(x, y, z)
    }

    pub fn level_in_bounds(&self, x: u16, y: u16, z: u16) -> bool {
        read(&self.level).in_bounds(x, y, z)
    }

    /// Apply a player's edit to the level. Returns the new block if anything changed.
    pub fn edit_level(
        &self,
        x: u16,
        y: u16,
        z: u16,
        action: BlockAction,
        block: BlockId,
    ) -> Option<BlockId> {
        write(&self.level).apply_edit(x, y, z, action, block)
    }
}
