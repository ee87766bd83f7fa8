use crate::adapter::{BlockResolver, DecodeStatus, Decoded, ProtocolCodec};
use crate::connection::PacketSink;
use crate::error::{ProtocolError, ProtocolResult};
use crate::fallback::{convert_block, BlockConversion, FallbackTable};
use crate::hooks::SessionHooks;
use crate::level::LevelSnapshot;
use crate::{ConnectionState, InboundPacket, OutboundPacket};
use bytes::{Buf, BytesMut};
use cobble_types::{
    BlockDefinitions, BlockId, EntityId, MessageKind, Orientation, Position, RawBlock,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock};
use tracing::{debug, info, trace, warn};

/// Server ID sent in the handshake reply when no authentication is done.
pub const OFFLINE_SERVER_ID: &str = "-";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// One client connection: identity, transform and capability state, composed with
/// the protocol codec chosen when the connection was accepted.
///
/// Decoding is driven by a single task per connection. Outbound operations may be
/// called from any task; every packet is fully encoded before it reaches the sink.
pub struct Session {
    id: u64,
    codec: Arc<dyn ProtocolCodec>,
    sink: Arc<dyn PacketSink>,
    hooks: Arc<dyn SessionHooks>,
    conversion: Arc<dyn BlockConversion>,
    state: Mutex<ConnectionState>,
    name: RwLock<String>,
    entity_id: OnceLock<EntityId>,
    transform: Mutex<(Position, Orientation)>,
    fallback: OnceLock<FallbackTable>,
    definitions: RwLock<Arc<BlockDefinitions>>,
    motd_sent: AtomicBool,
    /// Last transform sent to this client, per observed entity.
    last_sent: Mutex<HashMap<EntityId, (Position, Orientation)>>,
}

impl Session {
    pub fn new(
        id: u64,
        codec: Arc<dyn ProtocolCodec>,
        sink: Arc<dyn PacketSink>,
        hooks: Arc<dyn SessionHooks>,
        conversion: Arc<dyn BlockConversion>,
    ) -> Self {
        Self {
            id,
            codec,
            sink,
            hooks,
            conversion,
            state: Mutex::new(ConnectionState::Connecting),
            name: RwLock::new(String::new()),
            entity_id: OnceLock::new(),
            transform: Mutex::new((Position::default(), Orientation::default())),
            fallback: OnceLock::new(),
            definitions: RwLock::new(Arc::new(BlockDefinitions::new())),
            motd_sent: AtomicBool::new(false),
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn client_name(&self) -> &'static str {
        self.codec.client_name()
    }

    pub fn name(&self) -> String {
        self.name.read().map(|n| n.clone()).unwrap_or_default()
    }

    fn set_name(&self, name: &str) {
        if let Ok(mut n) = self.name.write() {
            *n = name.to_string();
        }
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id.get().copied()
    }

    /// Assign the entity ID other clients know this player by. Only the first call counts.
    pub fn set_entity_id(&self, id: EntityId) -> bool {
        self.entity_id.set(id).is_ok()
    }

    pub fn position(&self) -> Position {
        lock(&self.transform).0
    }

    pub fn orientation(&self) -> Orientation {
        lock(&self.transform).1
    }

    /// Record a transform decided by the server (spawn, teleport) without notifying hooks.
    pub fn set_transform(&self, position: Position, orientation: Orientation) {
        *lock(&self.transform) = (position, orientation);
    }

    pub fn fallback_table(&self) -> Option<&FallbackTable> {
        self.fallback.get()
    }

    /// Custom block definitions used when resolving blocks for this client.
    pub fn set_block_definitions(&self, definitions: Arc<BlockDefinitions>) {
        if let Ok(mut defs) = self.definitions.write() {
            *defs = definitions;
        }
    }

    // === Inbound ===

    /// Decode every complete packet in `buf`, leaving a trailing partial packet in place.
    /// A fatal error has already disconnected the session when it is returned.
    pub fn receive(&self, buf: &mut BytesMut) -> ProtocolResult<()> {
        while !buf.is_empty() && !self.state().is_terminal() {
            match self.handle_packet(&buf[..])? {
                DecodeStatus::NeedMore => break,
                DecodeStatus::Consumed(len) => buf.advance(len),
            }
        }
        Ok(())
    }

    /// Decode and apply the packet at the front of `buf`.
    ///
    /// Returns the number of bytes consumed, or `NeedMore` without consuming
    /// anything. Any error is fatal and tears the session down before returning.
    pub fn handle_packet(&self, buf: &[u8]) -> ProtocolResult<DecodeStatus> {
        if self.state().is_terminal() {
            return Ok(DecodeStatus::NeedMore);
        }
        let result = self.codec.decode(buf).and_then(|decoded| match decoded {
            Decoded::NeedMore => Ok(DecodeStatus::NeedMore),
            Decoded::Packet { len, packet } => {
                trace!("Session {} decoded {:?} ({} bytes)", self.id, packet, len);
                self.apply(packet)?;
                Ok(DecodeStatus::Consumed(len))
            }
        });
        if let Err(e) = &result {
            warn!("Session {} ({}): {}", self.id, self.name(), e);
            self.leave(&e.disconnect_reason());
        }
        result
    }

    fn apply(&self, packet: InboundPacket) -> ProtocolResult<()> {
        match packet {
            InboundPacket::Ping | InboundPacket::ArmSwing => {}
            InboundPacket::DigProgress { status } => {
                trace!("Session {} dig status {}", self.id, status);
            }
            InboundPacket::Handshake { name } => self.handle_handshake(&name)?,
            InboundPacket::Login { name, info } => self.handle_login(&name, &info)?,
            InboundPacket::Chat { text } => {
                if self.is_active() {
                    self.hooks.process_chat(self, &text);
                }
            }
            InboundPacket::Movement {
                position,
                orientation,
            } => {
                if self.is_active() {
                    let (pos, rot) = {
                        let mut t = lock(&self.transform);
                        if let Some(p) = position {
                            t.0 = p;
                        }
                        if let Some(o) = orientation {
                            t.1 = o;
                        }
                        *t
                    };
                    self.hooks.process_movement(self, pos, rot);
                }
            }
            InboundPacket::BlockChange {
                x,
                y,
                z,
                action,
                block,
            } => {
                if !self.is_active() {
                    return Ok(());
                }
                match (u16::try_from(x), u16::try_from(y), u16::try_from(z)) {
                    (Ok(x), Ok(y), Ok(z)) => {
                        self.hooks.process_block_change(self, x, y, z, action, block)
                    }
                    _ => debug!(
                        "Session {} edited outside the level at ({}, {}, {})",
                        self.id, x, y, z
                    ),
                }
            }
        }
        Ok(())
    }

    fn handle_handshake(&self, name: &str) -> ProtocolResult<()> {
        debug!("Session {} handshake from {}", self.id, name);
        {
            let mut state = lock(&self.state);
            if *state != ConnectionState::Connecting {
                debug!("Session {} ignoring repeated handshake", self.id);
                return Ok(());
            }
            *state = ConnectionState::AwaitingLogin;
        }
        self.set_name(name);
        self.send_handshake(OFFLINE_SERVER_ID)
    }

    /// Identity check, then the fallback table, then the login transition.
    /// Each step sees the effects of the one before it.
    fn handle_login(&self, name: &str, info: &[String; 2]) -> ProtocolResult<()> {
        if !self.state().accepts_login() {
            return Err(ProtocolError::MalformedField(
                "login packet on a logged in session".into(),
            ));
        }
        debug!("Session {} login info: {:?}", self.id, info);
        self.set_name(name);

        self.hooks
            .process_login(self, name)
            .map_err(ProtocolError::LoginRejected)?;

        let table = FallbackTable::build(self.conversion.as_ref(), self.codec.dialect());
        self.fallback.set(table).map_err(|_| {
            ProtocolError::MalformedField("fallback table already built".into())
        })?;

        {
            let mut state = lock(&self.state);
            if state.is_terminal() {
                return Ok(());
            }
            *state = ConnectionState::Active;
        }
        info!(
            "{} logged in using {} v{} (session {})",
            name,
            self.client_name(),
            self.codec.protocol_version(),
            self.id
        );
        self.hooks.complete_login(self);
        Ok(())
    }

    /// Move to the terminal state and notify the hooks. Later calls do nothing.
    pub fn leave(&self, reason: &str) {
        {
            let mut state = lock(&self.state);
            if state.is_terminal() {
                return;
            }
            *state = ConnectionState::Disconnecting;
        }
        info!("Session {} ({}) disconnected: {}", self.id, self.name(), reason);
        self.sink.close();
        lock(&self.last_sent).clear();
        self.hooks.disconnected(self, reason);
    }

    /// Send a kick message where the client supports one, then disconnect.
    pub fn kick(&self, reason: &str) {
        if let Err(e) = self.send(&OutboundPacket::Kick {
            reason: reason.to_string(),
        }) {
            debug!("Kick message to session {} failed: {}", self.id, e);
        }
        self.leave(reason);
    }

    // === Outbound ===

    /// Encode `packet` completely and hand the result to the transport in one call.
    /// Sends on a terminated session are dropped. A transport failure ends the session.
    pub fn send(&self, packet: &OutboundPacket) -> ProtocolResult<()> {
        if self.state().is_terminal() {
            return Ok(());
        }
        let frames = self.codec.encode(packet, self)?;
        if frames.is_empty() {
            return Ok(());
        }
        let frames = frames.into_iter().map(BytesMut::freeze).collect();
        if let Err(e) = self.sink.send(frames) {
            self.leave("Connection lost");
            return Err(e.into());
        }
        Ok(())
    }

    pub fn send_handshake(&self, server_id: &str) -> ProtocolResult<()> {
        self.send(&OutboundPacket::Handshake {
            server_id: server_id.to_string(),
        })
    }

    /// Returns `false` when the client has already had its MOTD and cannot take another.
    pub fn send_motd(&self, server_name: &str, motd: &str) -> ProtocolResult<bool> {
        if !self.codec.can_resend_motd() && self.motd_sent.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.send(&OutboundPacket::Motd {
            server_name: server_name.to_string(),
            motd: motd.to_string(),
        })?;
        self.motd_sent.store(true, Ordering::Release);
        Ok(true)
    }

    pub fn send_chat(&self, text: &str) -> ProtocolResult<()> {
        self.send(&OutboundPacket::Chat {
            text: text.to_string(),
        })
    }

    pub fn send_message(&self, kind: MessageKind, text: &str) -> ProtocolResult<()> {
        self.send(&OutboundPacket::Message {
            kind,
            text: text.to_string(),
        })
    }

    pub fn send_ping(&self) -> ProtocolResult<()> {
        self.send(&OutboundPacket::Ping)
    }

    pub fn send_teleport(
        &self,
        id: EntityId,
        position: Position,
        orientation: Orientation,
    ) -> ProtocolResult<()> {
        self.send(&OutboundPacket::Teleport {
            id,
            position,
            orientation,
        })?;
        self.mark_sent(id, position, orientation);
        Ok(())
    }

    pub fn send_spawn_entity(
        &self,
        id: EntityId,
        name: &str,
        skin: &str,
        position: Position,
        orientation: Orientation,
    ) -> ProtocolResult<()> {
        self.send(&OutboundPacket::SpawnEntity {
            id,
            name: name.to_string(),
            skin: skin.to_string(),
            position,
            orientation,
        })?;
        self.mark_sent(id, position, orientation);
        Ok(())
    }

    pub fn send_remove_entity(&self, id: EntityId) -> ProtocolResult<()> {
        lock(&self.last_sent).remove(&id);
        self.send(&OutboundPacket::RemoveEntity { id })
    }

    pub fn send_spawnpoint(&self, position: Position, orientation: Orientation) -> ProtocolResult<()> {
        self.send(&OutboundPacket::SetSpawnpoint {
            position,
            orientation,
        })
    }

    pub fn send_change_model(&self, id: EntityId, model: &str) -> ProtocolResult<()> {
        self.send(&OutboundPacket::ChangeModel {
            id,
            model: model.to_string(),
        })
    }

    pub fn send_add_tab_entry(
        &self,
        id: EntityId,
        name: &str,
        nick: &str,
        group: &str,
        group_rank: u8,
    ) -> ProtocolResult<()> {
        self.send(&OutboundPacket::AddTabEntry {
            id,
            name: name.to_string(),
            nick: nick.to_string(),
            group: group.to_string(),
            group_rank,
        })
    }

    pub fn send_remove_tab_entry(&self, id: EntityId) -> ProtocolResult<()> {
        self.send(&OutboundPacket::RemoveTabEntry { id })
    }

    pub fn send_block_change(&self, x: u16, y: u16, z: u16, block: BlockId) -> ProtocolResult<()> {
        self.send(&OutboundPacket::BlockChange { x, y, z, block })
    }

    pub fn send_bulk_block_change(
        &self,
        width: u16,
        length: u16,
        changes: Vec<(i32, BlockId)>,
    ) -> ProtocolResult<()> {
        self.send(&OutboundPacket::BulkBlockChange {
            width,
            length,
            changes,
        })
    }

    /// Transfer a whole level. The packets of the transfer go out as one batch;
    /// after a failure the transfer is redone from the start, never resumed.
    pub fn send_level(&self, level: Arc<LevelSnapshot>) -> ProtocolResult<()> {
        self.set_block_definitions(level.definitions.clone());
        lock(&self.last_sent).clear();
        self.send(&OutboundPacket::Level(level))
    }

    // === Position sync ===

    /// Record what this client was last told about entity `id`.
    /// Returns `true` when that differs from the previous record.
    pub fn mark_sent(&self, id: EntityId, position: Position, orientation: Orientation) -> bool {
        let mut last = lock(&self.last_sent);
        let changed = last.get(&id) != Some(&(position, orientation));
        last.insert(id, (position, orientation));
        changed
    }

    /// Whether `id`'s transform differs from what this client last received.
    pub fn needs_update(&self, id: EntityId, position: Position, orientation: Orientation) -> bool {
        match lock(&self.last_sent).get(&id) {
            Some((pos, rot)) => *pos != position || *rot != orientation,
            None => true,
        }
    }
}

impl BlockResolver for Session {
    /// Raw block this client is shown for canonical `block`.
    fn convert_block(&self, block: BlockId) -> RawBlock {
        let definitions = self
            .definitions
            .read()
            .map(|d| d.clone())
            .unwrap_or_default();
        let max_raw = self.codec.max_raw_block();
        match self.fallback.get() {
            Some(table) => convert_block(
                block,
                self.conversion.as_ref(),
                &definitions,
                table,
                max_raw,
            ),
            None => {
                let table = FallbackTable::build(self.conversion.as_ref(), self.codec.dialect());
                convert_block(block, self.conversion.as_ref(), &definitions, &table, max_raw)
            }
        }
    }
}
