use bytes::BytesMut;
use cobble_protocol_core::*;
use cobble_types::{BlockId, Dialect};

use crate::{decode, encode};

/// Codec for the Indev client generation (protocol version 9).
#[derive(Debug, Clone, Copy, Default)]
pub struct IndevCodec;

impl IndevCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ProtocolCodec for IndevCodec {
    fn client_name(&self) -> &'static str {
        "Indev"
    }

    fn protocol_version(&self) -> i32 {
        PROTOCOL_VERSION
    }

    fn dialect(&self) -> Dialect {
        Dialect::Classic
    }

    fn max_raw_block(&self) -> BlockId {
        Dialect::CustomBlocks.max_raw_block() as BlockId
    }

    // The client cannot be sent a second level, so it only ever gets one MOTD
    fn can_resend_motd(&self) -> bool {
        false
    }

    fn decode(&self, buf: &[u8]) -> ProtocolResult<Decoded> {
        decode::decode_packet(buf)
    }

    fn encode(
        &self,
        packet: &OutboundPacket,
        blocks: &dyn BlockResolver,
    ) -> ProtocolResult<Vec<BytesMut>> {
        encode::encode_packet(packet, blocks)
    }
}

pub const PROTOCOL_VERSION: i32 = 9;

// === Opcodes ===

pub const OPCODE_PING: u8 = 0x00;
pub const OPCODE_LOGIN: u8 = 0x01;
pub const OPCODE_HANDSHAKE: u8 = 0x02;
pub const OPCODE_CHAT: u8 = 0x03;
pub const OPCODE_SPAWN_POSITION: u8 = 0x06;

pub const OPCODE_SELF_STATEONLY: u8 = 0x0A;
pub const OPCODE_SELF_MOVE: u8 = 0x0B;
pub const OPCODE_SELF_LOOK: u8 = 0x0C;
pub const OPCODE_SELF_MOVE_LOOK: u8 = 0x0D;
pub const OPCODE_BLOCK_DIG: u8 = 0x0E;
pub const OPCODE_BLOCK_PLACE: u8 = 0x0F;

pub const OPCODE_ARM_ANIM: u8 = 0x12;
pub const OPCODE_NAMED_ADD: u8 = 0x14;
pub const OPCODE_REMOVE_ENTITY: u8 = 0x1D;
pub const OPCODE_TELEPORT: u8 = 0x22;
pub const OPCODE_PRE_CHUNK: u8 = 0x32;
pub const OPCODE_CHUNK: u8 = 0x33;
pub const OPCODE_BLOCK_CHANGE: u8 = 0x35;

// === Coordinate adaptation ===

// The client always draws its bottom two layers as lava whatever it is sent,
// so the whole world is shifted up instead.
/// Vertical shift of terrain and block packets, in blocks.
pub const WORLD_SHIFT_BLOCKS: i32 = 2;
/// Vertical shift of entity positions, in 1/32 block units.
pub const WORLD_SHIFT_COORDS: i32 = 64;

/// Client position updates report the feet; canonical positions are the eyes.
pub const FEET_TO_EYE: f32 = 1.59375;
/// Extra Y added when teleporting the client itself, in 1/32 block units.
pub const SELF_Y_OFFSET: i32 = 83;
/// Y adjustment for other entities' positions, in 1/32 block units.
pub const ENTITY_Y_OFFSET: i32 = -19;
/// Client yaw is measured from a heading half a turn away from canonical zero.
pub const YAW_OFFSET_DEGREES: f32 = 180.0;
/// Yaw correction for other entities, in 1/256 turns.
pub const ENTITY_YAW_OFFSET: u8 = 128;

/// Dig status of a block that has been broken.
pub const DIG_STATUS_FINISHED: u8 = 2;

// === Fixed fields of unknown purpose ===

/// Bytes between the name and the informational strings of the login packet.
pub const LOGIN_UNKNOWN_BYTES: usize = 8;
/// Leading zero bytes of the outbound login packet.
pub const MOTD_RESERVED_BYTES: usize = 14;
/// Third field of the level header packet.
pub const LEVEL_HEADER_CONSTANT: i32 = 100;
/// First body byte of the level dimensions packet.
pub const LEVEL_DIMENSIONS_FLAG: u8 = 0x01;

/// Canonical block Y to wire block Y.
pub fn block_y_to_wire(y: i32) -> i32 {
    y + WORLD_SHIFT_BLOCKS
}

/// Wire block Y to canonical block Y. May be negative for the hidden bottom layers.
pub fn block_y_from_wire(y: i32) -> i32 {
    y - WORLD_SHIFT_BLOCKS
}

/// Wire rotation in degrees to a fraction of a turn in 256ths, wrapping.
pub fn degrees_to_turn(degrees: f32) -> u8 {
    (degrees / 360.0 * 256.0) as i32 as u8
}

pub fn turn_to_degrees(turn: u8) -> f32 {
    turn as f32 * 360.0 / 256.0
}
