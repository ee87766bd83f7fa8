use cobble_protocol_core::*;
use cobble_types::block::AIR;
use cobble_types::{BlockAction, Orientation, Position, UNITS_PER_BLOCK};

use crate::adapter::*;

const PING_SIZE: usize = 1;
const STATEONLY_SIZE: usize = 1 + 1;
const MOVE_SIZE: usize = 1 + 4 * 4 + 1;
const LOOK_SIZE: usize = 1 + 4 * 2 + 1;
const MOVE_LOOK_SIZE: usize = 1 + 4 * 4 + 4 * 2 + 1;
const DIG_SIZE: usize = 1 + 1 + 4 + 1 + 4 + 1;
const PLACE_SIZE: usize = 1 + 2 + 4 + 1 + 4 + 1;
const ARM_ANIM_SIZE: usize = 1 + 4 + 1;

/// Decode one packet from the front of `buf`.
///
/// Returns `NeedMore` without consuming anything when the packet is incomplete.
/// Errors are fatal for the connection.
pub(crate) fn decode_packet(buf: &[u8]) -> ProtocolResult<Decoded> {
    let Some(&opcode) = buf.first() else {
        return Ok(Decoded::NeedMore);
    };
    match opcode {
        OPCODE_PING => fixed(buf, PING_SIZE, |_| Ok(InboundPacket::Ping)),
        OPCODE_HANDSHAKE => decode_handshake(buf),
        OPCODE_LOGIN => decode_login(buf),
        OPCODE_CHAT => decode_chat(buf),
        OPCODE_SELF_STATEONLY => fixed(buf, STATEONLY_SIZE, |_| {
            Ok(InboundPacket::Movement { position: None, orientation: None })
        }),
        OPCODE_SELF_MOVE => fixed(buf, MOVE_SIZE, decode_self_move),
        OPCODE_SELF_LOOK => fixed(buf, LOOK_SIZE, decode_self_look),
        OPCODE_SELF_MOVE_LOOK => fixed(buf, MOVE_LOOK_SIZE, decode_self_move_look),
        OPCODE_BLOCK_DIG => fixed(buf, DIG_SIZE, decode_block_dig),
        OPCODE_BLOCK_PLACE => fixed(buf, PLACE_SIZE, decode_block_place),
        OPCODE_ARM_ANIM => fixed(buf, ARM_ANIM_SIZE, |_| Ok(InboundPacket::ArmSwing)),
        other => Err(ProtocolError::UnknownOpcode(other)),
    }
}

fn fixed<F>(buf: &[u8], size: usize, parse: F) -> ProtocolResult<Decoded>
where
    F: FnOnce(&[u8]) -> ProtocolResult<InboundPacket>,
{
    if buf.len() < size {
        return Ok(Decoded::NeedMore);
    }
    let packet = parse(&buf[..size])?;
    Ok(Decoded::Packet { len: size, packet })
}

/// Read the text at `offset`, returning it with the offset just past it,
/// or `None` when the buffer does not hold all of it yet.
fn text_at(buf: &[u8], offset: usize) -> ProtocolResult<Option<(String, usize)>> {
    if buf.len() < offset + 2 {
        return Ok(None);
    }
    let end = offset + 2 + read_text_len(buf, offset)?;
    if buf.len() < end {
        return Ok(None);
    }
    Ok(Some((read_text(buf, offset)?, end)))
}

fn decode_handshake(buf: &[u8]) -> ProtocolResult<Decoded> {
    let Some((name, len)) = text_at(buf, 1)? else {
        return Ok(Decoded::NeedMore);
    };
    Ok(Decoded::Packet { len, packet: InboundPacket::Handshake { name } })
}

fn decode_chat(buf: &[u8]) -> ProtocolResult<Decoded> {
    let Some((text, len)) = text_at(buf, 1)? else {
        return Ok(Decoded::NeedMore);
    };
    Ok(Decoded::Packet { len, packet: InboundPacket::Chat { text } })
}

fn decode_login(buf: &[u8]) -> ProtocolResult<Decoded> {
    if buf.len() < 1 + 4 {
        return Ok(Decoded::NeedMore);
    }
    // Checked before the rest arrives so a wrong client is turned away at once
    let version = read_i32(buf, 1)?;
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::ProtocolMismatch { expected: PROTOCOL_VERSION, got: version });
    }

    let Some((name, offset)) = text_at(buf, 1 + 4)? else {
        return Ok(Decoded::NeedMore);
    };
    let offset = offset + LOGIN_UNKNOWN_BYTES;
    let Some((motd1, offset)) = text_at(buf, offset)? else {
        return Ok(Decoded::NeedMore);
    };
    let Some((motd2, len)) = text_at(buf, offset)? else {
        return Ok(Decoded::NeedMore);
    };
    Ok(Decoded::Packet { len, packet: InboundPacket::Login { name, info: [motd1, motd2] } })
}

/// Position update at `offset`: x, feet y, stance, z.
fn read_position(buf: &[u8], offset: usize) -> ProtocolResult<Position> {
    let x = read_f32(buf, offset)?;
    let y = read_f32(buf, offset + 4)?;
    let z = read_f32(buf, offset + 12)?;
    Ok(wire_to_position(x, y, z))
}

fn read_orientation(buf: &[u8], offset: usize) -> ProtocolResult<Orientation> {
    let yaw = read_f32(buf, offset)?;
    let pitch = read_f32(buf, offset + 4)?;
    Ok(wire_to_orientation(yaw, pitch))
}

/// Client feet position in blocks to a canonical position.
pub(crate) fn wire_to_position(x: f32, y: f32, z: f32) -> Position {
    let y = y + FEET_TO_EYE - WORLD_SHIFT_BLOCKS as f32;
    let scale = UNITS_PER_BLOCK as f32;
    Position::new((x * scale) as i32, (y * scale) as i32, (z * scale) as i32)
}

pub(crate) fn wire_to_orientation(yaw: f32, pitch: f32) -> Orientation {
    Orientation::new(degrees_to_turn(yaw + YAW_OFFSET_DEGREES), degrees_to_turn(pitch))
}

fn decode_self_move(buf: &[u8]) -> ProtocolResult<InboundPacket> {
    Ok(InboundPacket::Movement { position: Some(read_position(buf, 1)?), orientation: None })
}

fn decode_self_look(buf: &[u8]) -> ProtocolResult<InboundPacket> {
    Ok(InboundPacket::Movement { position: None, orientation: Some(read_orientation(buf, 1)?) })
}

fn decode_self_move_look(buf: &[u8]) -> ProtocolResult<InboundPacket> {
    Ok(InboundPacket::Movement {
        position: Some(read_position(buf, 1)?),
        orientation: Some(read_orientation(buf, 17)?),
    })
}

fn decode_block_dig(buf: &[u8]) -> ProtocolResult<InboundPacket> {
    let status = read_u8(buf, 1)?;
    let x = read_i32(buf, 2)?;
    let y = block_y_from_wire(read_u8(buf, 6)? as i32);
    let z = read_i32(buf, 7)?;
    // face at 11 is unused

    if status != DIG_STATUS_FINISHED {
        return Ok(InboundPacket::DigProgress { status });
    }
    Ok(InboundPacket::BlockChange { x, y, z, action: BlockAction::Destroy, block: AIR })
}

fn decode_block_place(buf: &[u8]) -> ProtocolResult<InboundPacket> {
    let block = read_u16(buf, 1)?;
    let x = read_i32(buf, 3)?;
    let y = block_y_from_wire(read_u8(buf, 7)? as i32);
    let z = read_i32(buf, 8)?;
    Ok(InboundPacket::BlockChange { x, y, z, action: BlockAction::Place, block })
}
