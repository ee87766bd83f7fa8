use crate::level::LevelSnapshot;
use cobble_types::{BlockAction, BlockId, EntityId, MessageKind, Orientation, Position};
use std::sync::Arc;

/// Version-independent view of a packet received from a client.
/// Protocol codecs decode wire bytes into these; coordinates are already canonical.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPacket {
    Ping,
    Handshake {
        name: String,
    },
    /// The protocol version has already been checked by the codec.
    Login {
        name: String,
        /// Informational strings the client sends along; usually loading screen text.
        info: [String; 2],
    },
    Chat {
        text: String,
    },
    /// A player moved and/or turned. Missing parts keep their current value.
    Movement {
        position: Option<Position>,
        orientation: Option<Orientation>,
    },
    /// A block edit. `y` may be negative when the client edits below the shifted world.
    BlockChange {
        x: i32,
        y: i32,
        z: i32,
        action: BlockAction,
        block: BlockId,
    },
    /// Digging that has not finished yet. Consumed without effect.
    DigProgress {
        status: u8,
    },
    ArmSwing,
}

/// Version-independent outbound message. Protocol codecs encode each into
/// zero or more complete wire packets.
#[derive(Debug, Clone)]
pub enum OutboundPacket {
    Handshake {
        server_id: String,
    },
    Motd {
        server_name: String,
        motd: String,
    },
    /// Normal chat. Codecs wrap long text into several packets.
    Chat {
        text: String,
    },
    Message {
        kind: MessageKind,
        text: String,
    },
    Ping,
    Kick {
        reason: String,
    },
    /// Move an entity. Targeting [`cobble_types::SELF_ID`] moves the client itself.
    Teleport {
        id: EntityId,
        position: Position,
        orientation: Orientation,
    },
    SpawnEntity {
        id: EntityId,
        name: String,
        skin: String,
        position: Position,
        orientation: Orientation,
    },
    RemoveEntity {
        id: EntityId,
    },
    SetSpawnpoint {
        position: Position,
        orientation: Orientation,
    },
    ChangeModel {
        id: EntityId,
        model: String,
    },
    AddTabEntry {
        id: EntityId,
        name: String,
        nick: String,
        group: String,
        group_rank: u8,
    },
    RemoveTabEntry {
        id: EntityId,
    },
    BlockChange {
        x: u16,
        y: u16,
        z: u16,
        block: BlockId,
    },
    /// Several block changes in one send. `index` is the linear index into a level
    /// of the given width and length (`(y * length + z) * width + x`).
    BulkBlockChange {
        width: u16,
        length: u16,
        changes: Vec<(i32, BlockId)>,
    },
    /// Full level transfer. Always encoded as one ordered multi-packet sequence.
    Level(Arc<LevelSnapshot>),
}
