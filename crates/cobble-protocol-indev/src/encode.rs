use bytes::{BufMut, BytesMut};
use cobble_protocol_core::compression::compress_with_length;
use cobble_protocol_core::level::index_to_coords;
use cobble_protocol_core::text::{cleanup_colors, wordwrap, LINE_LENGTH};
use cobble_protocol_core::*;
use cobble_types::{
    BlockId, EntityId, MessageKind, Orientation, Position, RawBlock, SELF_ID, UNITS_PER_BLOCK,
};
use std::collections::HashMap;
use tracing::debug;

use crate::adapter::*;

const BLOCK_CHANGE_SIZE: usize = 1 + 4 + 1 + 4 + 1 + 1;
const SELF_MOVE_LOOK_SIZE: usize = 1 + 4 * 4 + 4 * 2 + 1;
const LEVEL_DIMENSIONS_SIZE: usize = 21;

pub(crate) fn encode_packet(
    packet: &OutboundPacket,
    blocks: &dyn BlockResolver,
) -> ProtocolResult<Vec<BytesMut>> {
    match packet {
        OutboundPacket::Handshake { server_id } => Ok(vec![build_handshake(server_id)?]),
        OutboundPacket::Motd { server_name, motd } => Ok(vec![build_motd(server_name, motd)?]),
        OutboundPacket::Chat { text } => build_wrapped_chat(text),
        OutboundPacket::Message { kind, text } => match kind {
            MessageKind::Normal => Ok(vec![build_chat(&convert_colors(text))?]),
            other => {
                debug!("Dropping {:?} message, not supported by client", other);
                Ok(Vec::new())
            }
        },
        OutboundPacket::Ping => Ok(vec![BytesMut::from(&[OPCODE_PING][..])]),
        OutboundPacket::Kick { reason } => {
            debug!("Client has no kick packet, dropping reason {:?}", reason);
            Ok(Vec::new())
        }
        OutboundPacket::Teleport { id, position, orientation } => {
            if *id == SELF_ID {
                Ok(vec![build_self_move_look(*position, *orientation)])
            } else {
                Ok(vec![build_entity_teleport(*id, *position, *orientation)])
            }
        }
        OutboundPacket::SpawnEntity { id, name, position, orientation, .. } => {
            if *id == SELF_ID {
                Ok(vec![build_self_move_look(*position, *orientation)])
            } else {
                let name = convert_colors(&cleanup_colors(name));
                Ok(vec![build_named_add(*id, &name, *position, *orientation)?])
            }
        }
        OutboundPacket::RemoveEntity { id } => {
            let mut buf = BytesMut::with_capacity(5);
            buf.put_u8(OPCODE_REMOVE_ENTITY);
            write_i32(&mut buf, *id as i32);
            Ok(vec![buf])
        }
        OutboundPacket::SetSpawnpoint { position, .. } => Ok(vec![build_spawn_position(*position)]),
        OutboundPacket::ChangeModel { .. } => Ok(Vec::new()),
        OutboundPacket::AddTabEntry { .. } | OutboundPacket::RemoveTabEntry { .. } => {
            Err(ProtocolError::UnimplementedCapability("tab list entries"))
        }
        OutboundPacket::BlockChange { x, y, z, block } => {
            let raw = blocks.convert_block(*block);
            Ok(vec![build_block_change(*x as i32, *y as i32, *z as i32, raw)?])
        }
        OutboundPacket::BulkBlockChange { width, length, changes } => {
            build_bulk_block_change(*width, *length, changes, blocks)
        }
        OutboundPacket::Level(level) => build_level(level, blocks),
    }
}

/// Classic colour codes use '&', this client uses '§'.
fn convert_colors(text: &str) -> String {
    text.replace('&', "§")
}

fn build_handshake(server_id: &str) -> ProtocolResult<BytesMut> {
    let mut buf = BytesMut::with_capacity(3 + text_byte_len(server_id));
    buf.put_u8(OPCODE_HANDSHAKE);
    write_text(&mut buf, server_id)?;
    Ok(buf)
}

fn build_motd(server_name: &str, motd: &str) -> ProtocolResult<BytesMut> {
    let mut buf = BytesMut::with_capacity(
        1 + MOTD_RESERVED_BYTES + 4 + text_byte_len(server_name) + text_byte_len(motd),
    );
    buf.put_u8(OPCODE_LOGIN);
    buf.put_bytes(0, MOTD_RESERVED_BYTES);
    write_text(&mut buf, server_name)?;
    write_text(&mut buf, motd)?;
    Ok(buf)
}

fn build_chat(text: &str) -> ProtocolResult<BytesMut> {
    let mut buf = BytesMut::with_capacity(3 + text_byte_len(text));
    buf.put_u8(OPCODE_CHAT);
    write_text(&mut buf, text)?;
    Ok(buf)
}

/// One chat packet per wrapped line, in order.
fn build_wrapped_chat(text: &str) -> ProtocolResult<Vec<BytesMut>> {
    let text = cleanup_colors(text);
    wordwrap(&text, LINE_LENGTH)
        .iter()
        .map(|line| build_chat(&convert_colors(line)))
        .collect()
}

fn build_self_move_look(position: Position, orientation: Orientation) -> BytesMut {
    let scale = UNITS_PER_BLOCK as f32;
    let y = position
        .y
        .wrapping_add(SELF_Y_OFFSET + WORLD_SHIFT_COORDS) as f32
        / scale;

    let mut buf = BytesMut::with_capacity(SELF_MOVE_LOOK_SIZE);
    buf.put_u8(OPCODE_SELF_MOVE_LOOK);
    write_f32(&mut buf, position.x as f32 / scale);
    write_f32(&mut buf, y); // stance
    write_f32(&mut buf, y);
    write_f32(&mut buf, position.z as f32 / scale);
    write_f32(&mut buf, turn_to_degrees(orientation.rot_y));
    write_f32(&mut buf, turn_to_degrees(orientation.head_x));
    buf.put_u8(1); // on ground
    buf
}

/// Client-sent positions are unbounded, so the offset wraps like the wire int.
fn entity_y(position: Position) -> i32 {
    position.y.wrapping_add(ENTITY_Y_OFFSET + WORLD_SHIFT_COORDS)
}

fn build_named_add(
    id: EntityId,
    name: &str,
    position: Position,
    orientation: Orientation,
) -> ProtocolResult<BytesMut> {
    let mut buf = BytesMut::with_capacity(1 + 4 + 2 + text_byte_len(name) + 12 + 2 + 2);
    buf.put_u8(OPCODE_NAMED_ADD);
    write_i32(&mut buf, id as i32);
    write_text(&mut buf, name)?;
    write_i32(&mut buf, position.x);
    write_i32(&mut buf, entity_y(position));
    write_i32(&mut buf, position.z);
    buf.put_u8(orientation.rot_y.wrapping_add(ENTITY_YAW_OFFSET));
    buf.put_u8(orientation.head_x);
    write_u16(&mut buf, 0); // held item
    Ok(buf)
}

fn build_entity_teleport(id: EntityId, position: Position, orientation: Orientation) -> BytesMut {
    let mut buf = BytesMut::with_capacity(1 + 4 + 12 + 2);
    buf.put_u8(OPCODE_TELEPORT);
    write_i32(&mut buf, id as i32);
    write_i32(&mut buf, position.x);
    write_i32(&mut buf, entity_y(position));
    write_i32(&mut buf, position.z);
    buf.put_u8(orientation.rot_y.wrapping_add(ENTITY_YAW_OFFSET));
    buf.put_u8(orientation.head_x);
    buf
}

fn build_spawn_position(position: Position) -> BytesMut {
    let mut buf = BytesMut::with_capacity(1 + 12);
    buf.put_u8(OPCODE_SPAWN_POSITION);
    write_i32(&mut buf, position.block_x());
    write_i32(&mut buf, block_y_to_wire(position.block_y()));
    write_i32(&mut buf, position.block_z());
    buf
}

fn build_block_change(x: i32, y: i32, z: i32, raw: RawBlock) -> ProtocolResult<BytesMut> {
    let wire_y = u8::try_from(block_y_to_wire(y))
        .map_err(|_| ProtocolError::MalformedField(format!("block Y {} out of range", y)))?;

    let mut buf = BytesMut::with_capacity(BLOCK_CHANGE_SIZE);
    buf.put_u8(OPCODE_BLOCK_CHANGE);
    write_i32(&mut buf, x);
    buf.put_u8(wire_y);
    write_i32(&mut buf, z);
    buf.put_u8(raw);
    buf.put_u8(0); // metadata
    Ok(buf)
}

fn build_bulk_block_change(
    width: u16,
    length: u16,
    changes: &[(i32, BlockId)],
    blocks: &dyn BlockResolver,
) -> ProtocolResult<Vec<BytesMut>> {
    changes
        .iter()
        .map(|&(index, block)| {
            let index = usize::try_from(index).map_err(|_| {
                ProtocolError::MalformedField(format!("negative block index {}", index))
            })?;
            let (x, y, z) = index_to_coords(index, width, length);
            build_block_change(x as i32, y as i32, z as i32, blocks.convert_block(block))
        })
        .collect()
}

/// Level transfer: compressed header, dimensions, then spawn position.
fn build_level(level: &LevelSnapshot, blocks: &dyn BlockResolver) -> ProtocolResult<Vec<BytesMut>> {
    let (raw_blocks, metadata) = shifted_terrain(level, blocks);
    let blocks_gz = compress_with_length(&raw_blocks)?;
    let meta_gz = compress_with_length(&metadata)?;
    debug!(
        "Level {}x{}x{} compressed to {} + {} bytes",
        level.width,
        level.height,
        level.length,
        blocks_gz.len(),
        meta_gz.len()
    );

    let mut header = BytesMut::with_capacity(1 + 4 * 5 + blocks_gz.len() + meta_gz.len());
    header.put_u8(OPCODE_PRE_CHUNK);
    write_i32(&mut header, blocks_gz.len() as i32);
    write_i32(&mut header, meta_gz.len() as i32);
    write_i32(&mut header, LEVEL_HEADER_CONSTANT);
    write_i32(&mut header, blocks_gz.len() as i32);
    header.put_slice(&blocks_gz);
    write_i32(&mut header, meta_gz.len() as i32);
    header.put_slice(&meta_gz);

    let mut dims = BytesMut::with_capacity(LEVEL_DIMENSIONS_SIZE);
    dims.put_u8(OPCODE_CHUNK);
    dims.put_u8(LEVEL_DIMENSIONS_FLAG);
    dims.put_bytes(0, 3);
    write_i32(&mut dims, level.width as i32);
    write_i32(&mut dims, level.height as i32);
    write_i32(&mut dims, level.length as i32);
    dims.put_bytes(0, 4);

    Ok(vec![header, dims, build_spawn_position(level.spawn)])
}

/// Level arrays moved up by the world shift. The bottom layers stay air and
/// the top layers of the level are cut off.
fn shifted_terrain(level: &LevelSnapshot, blocks: &dyn BlockResolver) -> (Vec<u8>, Vec<u8>) {
    let volume = level.volume();
    let layer = level.width as usize * level.length as usize;
    let start = (WORLD_SHIFT_BLOCKS as usize * layer).min(volume);

    let mut raw_blocks = vec![0u8; volume];
    let mut metadata = vec![0u8; volume];
    let mut cache: HashMap<BlockId, RawBlock> = HashMap::new();
    for (dst, &block) in raw_blocks[start..].iter_mut().zip(&level.blocks) {
        *dst = *cache.entry(block).or_insert_with(|| blocks.convert_block(block));
    }
    for (dst, &meta) in metadata[start..].iter_mut().zip(&level.metadata) {
        *dst = meta;
    }
    (raw_blocks, metadata)
}
