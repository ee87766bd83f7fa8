use crate::decode::{decode_packet, wire_to_position};
use crate::*;
use bytes::{BufMut, Bytes, BytesMut};
use cobble_protocol_core::compression::decompress_with_length;
use cobble_protocol_core::*;
use cobble_types::block::{AIR, COBBLESTONE, STONE};
use cobble_types::{
    BlockAction, BlockDefinition, BlockDefinitions, BlockId, MessageKind, Orientation, Position,
    SELF_ID,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Hooks {
    events: Mutex<Vec<String>>,
}

impl Hooks {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl SessionHooks for Hooks {
    fn process_login(&self, _session: &Session, name: &str) -> Result<(), String> {
        self.push(format!("login {}", name));
        Ok(())
    }

    fn complete_login(&self, _session: &Session) {
        self.push("complete".into());
    }

    fn process_movement(&self, _session: &Session, position: Position, orientation: Orientation) {
        self.push(format!(
            "move {} {} {} {} {}",
            position.x, position.y, position.z, orientation.rot_y, orientation.head_x
        ));
    }

    fn process_block_change(
        &self,
        _session: &Session,
        x: u16,
        y: u16,
        z: u16,
        action: BlockAction,
        block: BlockId,
    ) {
        self.push(format!("block {} {} {} {:?} {}", x, y, z, action, block));
    }

    fn process_chat(&self, _session: &Session, text: &str) {
        self.push(format!("chat {}", text));
    }

    fn disconnected(&self, _session: &Session, reason: &str) {
        self.push(format!("left {}", reason));
    }
}

fn new_session() -> (Session, Arc<Hooks>, Arc<MemorySink>) {
    let hooks = Arc::new(Hooks::default());
    let sink = Arc::new(MemorySink::new());
    let session = Session::new(
        7,
        Arc::new(IndevCodec::new()),
        sink.clone(),
        hooks.clone(),
        Arc::new(StandardBlocks),
    );
    (session, hooks, sink)
}

fn login_packet(version: i32, name: &str) -> BytesMut {
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_LOGIN);
    write_i32(&mut buf, version);
    write_text(&mut buf, name).unwrap();
    buf.put_bytes(0xAB, LOGIN_UNKNOWN_BYTES);
    write_text(&mut buf, "Loading level").unwrap();
    write_text(&mut buf, "Please wait").unwrap();
    buf
}

fn chat_packet(text: &str) -> BytesMut {
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_CHAT);
    write_text(&mut buf, text).unwrap();
    buf
}

fn logged_in() -> (Session, Arc<Hooks>, Arc<MemorySink>) {
    let (session, hooks, sink) = new_session();
    session.receive(&mut login_packet(PROTOCOL_VERSION, "Steve")).unwrap();
    assert!(session.is_active());
    (session, hooks, sink)
}

fn decode_one(buf: &[u8]) -> InboundPacket {
    match decode_packet(buf).unwrap() {
        Decoded::Packet { len, packet } => {
            assert_eq!(len, buf.len());
            packet
        }
        Decoded::NeedMore => panic!("expected a whole packet"),
    }
}

fn raw_text(packet: &Bytes, offset: usize) -> String {
    read_text(packet, offset).unwrap()
}

#[test]
fn test_login_activates_session() {
    let (session, hooks, sink) = new_session();
    let mut buf = login_packet(9, "Steve");
    session.receive(&mut buf).unwrap();

    assert!(buf.is_empty());
    assert_eq!(session.state(), ConnectionState::Active);
    assert_eq!(session.name(), "Steve");
    assert_eq!(session.fallback_table().unwrap().as_slice().len(), 256);
    assert_eq!(hooks.events(), vec!["login Steve", "complete"]);
    assert!(sink.packets().is_empty());
}

#[test]
fn test_login_version_mismatch_is_fatal() {
    let (session, hooks, sink) = new_session();
    let mut buf = login_packet(8, "Steve");
    buf.extend_from_slice(&chat_packet("hello"));

    let err = session.receive(&mut buf).unwrap_err();
    assert!(matches!(err, ProtocolError::ProtocolMismatch { expected: 9, got: 8 }));
    assert_eq!(session.state(), ConnectionState::Disconnecting);
    assert_eq!(
        hooks.events(),
        vec![format!("left {}", err.disconnect_reason())]
    );
    assert!(sink.is_closed());
    assert!(sink.packets().is_empty());
}

#[test]
fn test_login_version_checked_before_rest_arrives() {
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_LOGIN);
    write_i32(&mut buf, 7);
    assert!(matches!(
        decode_packet(&buf),
        Err(ProtocolError::ProtocolMismatch { got: 7, .. })
    ));

    let full = login_packet(PROTOCOL_VERSION, "Steve");
    for cut in 0..full.len() {
        assert_eq!(decode_packet(&full[..cut]).unwrap(), Decoded::NeedMore, "cut {}", cut);
    }
}

#[test]
fn test_login_fields() {
    let buf = login_packet(PROTOCOL_VERSION, "Alex");
    assert_eq!(
        decode_one(&buf),
        InboundPacket::Login {
            name: "Alex".into(),
            info: ["Loading level".into(), "Please wait".into()],
        }
    );
}

#[test]
fn test_handshake_replies_offline_id() {
    let (session, _hooks, sink) = new_session();
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_HANDSHAKE);
    write_text(&mut buf, "Steve").unwrap();
    session.receive(&mut buf).unwrap();

    assert_eq!(session.state(), ConnectionState::AwaitingLogin);
    let packets = sink.packets();
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0][0], OPCODE_HANDSHAKE);
    assert_eq!(raw_text(&packets[0], 1), "-");
}

#[test]
fn test_unknown_opcode_is_fatal() {
    let (session, hooks, _sink) = logged_in();
    let err = session.receive(&mut BytesMut::from(&[0x7Fu8, 1, 2][..])).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownOpcode(0x7F)));
    assert_eq!(
        hooks.events().last().unwrap(),
        &format!("left {}", err.disconnect_reason())
    );
}

#[test]
fn test_fixed_sizes() {
    let sizes = [
        (OPCODE_PING, 1),
        (OPCODE_SELF_STATEONLY, 2),
        (OPCODE_SELF_MOVE, 18),
        (OPCODE_SELF_LOOK, 10),
        (OPCODE_SELF_MOVE_LOOK, 26),
        (OPCODE_BLOCK_DIG, 12),
        (OPCODE_BLOCK_PLACE, 13),
        (OPCODE_ARM_ANIM, 6),
    ];
    for (opcode, size) in sizes {
        let mut buf = vec![0u8; size + 3];
        buf[0] = opcode;
        assert_eq!(decode_packet(&buf[..size - 1]).unwrap(), Decoded::NeedMore);
        match decode_packet(&buf).unwrap() {
            Decoded::Packet { len, .. } => assert_eq!(len, size, "opcode {:#x}", opcode),
            Decoded::NeedMore => panic!("opcode {:#x} needed more", opcode),
        }
    }
}

#[test]
fn test_self_move_converts_feet_to_eyes() {
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_SELF_MOVE);
    write_f32(&mut buf, 10.5);
    write_f32(&mut buf, 5.0);
    write_f32(&mut buf, 6.62);
    write_f32(&mut buf, -3.25);
    buf.put_u8(1);

    // (5 + 1.59375 - 2) * 32 = 147
    assert_eq!(
        decode_one(&buf),
        InboundPacket::Movement {
            position: Some(Position::new(336, 147, -104)),
            orientation: None,
        }
    );
}

#[test]
fn test_self_look_offsets_yaw() {
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_SELF_LOOK);
    write_f32(&mut buf, 0.0);
    write_f32(&mut buf, 90.0);
    buf.put_u8(1);

    assert_eq!(
        decode_one(&buf),
        InboundPacket::Movement {
            position: None,
            orientation: Some(Orientation::new(128, 64)),
        }
    );
}

#[test]
fn test_rotation_wraps() {
    assert_eq!(degrees_to_turn(360.0), 0);
    assert_eq!(degrees_to_turn(450.0), 64);
    assert_eq!(degrees_to_turn(-90.0), 192);
    assert_eq!(degrees_to_turn(f32::NAN), 0);
}

#[test]
fn test_movement_updates_session() {
    let (session, hooks, _sink) = logged_in();
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_SELF_MOVE_LOOK);
    write_f32(&mut buf, 1.0);
    write_f32(&mut buf, 2.40625);
    write_f32(&mut buf, 4.0);
    write_f32(&mut buf, 3.0);
    write_f32(&mut buf, 180.0);
    write_f32(&mut buf, 0.0);
    buf.put_u8(0);
    buf.put_u8(OPCODE_SELF_STATEONLY);
    buf.put_u8(1);
    session.receive(&mut buf).unwrap();

    assert!(buf.is_empty());
    assert_eq!(session.position(), Position::new(32, 64, 96));
    assert_eq!(session.orientation(), Orientation::new(0, 0));
    let events = hooks.events();
    assert_eq!(&events[2..], ["move 32 64 96 0 0", "move 32 64 96 0 0"]);
}

#[test]
fn test_dig_only_finished_destroys() {
    let dig = |status: u8| {
        let mut buf = BytesMut::new();
        buf.put_u8(OPCODE_BLOCK_DIG);
        buf.put_u8(status);
        write_i32(&mut buf, 4);
        buf.put_u8(12);
        write_i32(&mut buf, 9);
        buf.put_u8(1);
        buf
    };

    assert_eq!(decode_one(&dig(0)), InboundPacket::DigProgress { status: 0 });
    assert_eq!(decode_one(&dig(1)), InboundPacket::DigProgress { status: 1 });
    assert_eq!(
        decode_one(&dig(DIG_STATUS_FINISHED)),
        InboundPacket::BlockChange {
            x: 4,
            y: 10,
            z: 9,
            action: BlockAction::Destroy,
            block: AIR,
        }
    );
}

#[test]
fn test_place_shifts_down() {
    let place = |y: u8| {
        let mut buf = BytesMut::new();
        buf.put_u8(OPCODE_BLOCK_PLACE);
        write_u16(&mut buf, COBBLESTONE);
        write_i32(&mut buf, 1);
        buf.put_u8(y);
        write_i32(&mut buf, 2);
        buf.put_u8(1);
        buf
    };

    let (session, hooks, _sink) = logged_in();
    let mut buf = place(5);
    // Placing into the hidden lava layers is ignored
    buf.extend_from_slice(&place(1));
    session.receive(&mut buf).unwrap();

    assert!(buf.is_empty());
    assert_eq!(&hooks.events()[2..], ["block 1 3 2 Place 4"]);
}

#[test]
fn test_vertical_shift_identity() {
    for y in 0..256 {
        assert_eq!(block_y_from_wire(block_y_to_wire(y)), y);
    }
}

#[test]
fn test_split_chat_reassembles() {
    let (session, hooks, _sink) = logged_in();
    let packet = chat_packet("split me");
    let mut buf = BytesMut::new();
    for byte in packet.iter() {
        buf.put_u8(*byte);
        session.receive(&mut buf).unwrap();
    }
    assert!(buf.is_empty());
    assert_eq!(hooks.events().last().unwrap(), "chat split me");
}

#[test]
fn test_block_change_uses_level_fallback() {
    let (session, _hooks, sink) = logged_in();
    let mut defs = BlockDefinitions::new();
    defs.define(4000, BlockDefinition::new("Marble", COBBLESTONE as u8));
    session.set_block_definitions(Arc::new(defs));

    session.send_block_change(3, 10, 5, 4000).unwrap();
    let packets = sink.take();
    assert_eq!(packets.len(), 1);
    assert_eq!(
        &packets[0][..],
        &[OPCODE_BLOCK_CHANGE, 0, 0, 0, 3, 12, 0, 0, 0, 5, 4, 0][..]
    );

    session
        .send_bulk_block_change(16, 16, vec![(0, 4000), ((2 * 16 + 3) * 16 + 1, 4000)])
        .unwrap();
    let packets = sink.take();
    assert_eq!(packets.len(), 2);
    for packet in &packets {
        assert_eq!(packet.len(), 12);
        assert_eq!(packet[10], 4);
    }
    // index (2 * 16 + 3) * 16 + 1 is x 1, y 2, z 3
    assert_eq!(read_i32(&packets[1], 1).unwrap(), 1);
    assert_eq!(packets[1][5], 4);
    assert_eq!(read_i32(&packets[1], 6).unwrap(), 3);
}

#[test]
fn test_long_chat_is_wrapped() {
    let (session, _hooks, sink) = logged_in();
    let words: Vec<String> = (0..40).map(|i| format!("word{}", i)).collect();
    let message = words.join(" ");
    session.send_chat(&message).unwrap();

    let packets = sink.packets();
    assert!(packets.len() > 1);
    let mut rebuilt = String::new();
    for (i, packet) in packets.iter().enumerate() {
        assert_eq!(packet[0], OPCODE_CHAT);
        let line = raw_text(packet, 1);
        assert!(line.chars().count() <= 64);
        if i == 0 {
            rebuilt.push_str(&line);
        } else {
            rebuilt.push_str(line.strip_prefix("> ").unwrap());
        }
    }
    assert_eq!(rebuilt, message);
}

#[test]
fn test_chat_colors_translated() {
    let (session, _hooks, sink) = logged_in();
    session.send_chat("&aHello").unwrap();
    let packets = sink.packets();
    assert_eq!(raw_text(&packets[0], 1), "§aHello");
}

#[test]
fn test_only_normal_messages_sent() {
    let (session, _hooks, sink) = logged_in();
    session.send_message(MessageKind::Status1, "status").unwrap();
    session.send_message(MessageKind::Announcement, "look").unwrap();
    assert!(sink.packets().is_empty());

    session.send_message(MessageKind::Normal, "&ehi").unwrap();
    let packets = sink.packets();
    assert_eq!(packets.len(), 1);
    assert_eq!(raw_text(&packets[0], 1), "§ehi");
}

#[test]
fn test_motd_sent_once() {
    let (session, _hooks, sink) = logged_in();
    assert!(session.send_motd("Server", "Welcome").unwrap());
    assert!(!session.send_motd("Server", "Again").unwrap());

    let packets = sink.packets();
    assert_eq!(packets.len(), 1);
    let packet = &packets[0];
    assert_eq!(packet[0], OPCODE_LOGIN);
    assert!(packet[1..1 + MOTD_RESERVED_BYTES].iter().all(|b| *b == 0));
    let offset = 1 + MOTD_RESERVED_BYTES;
    assert_eq!(raw_text(packet, offset), "Server");
    assert_eq!(raw_text(packet, offset + 2 + 12), "Welcome");
}

#[test]
fn test_self_teleport_is_move_look() {
    let (session, _hooks, sink) = logged_in();
    session
        .send_teleport(SELF_ID, Position::new(64, 32, 96), Orientation::new(64, 0))
        .unwrap();

    let packets = sink.packets();
    assert_eq!(packets.len(), 1);
    let packet = &packets[0];
    assert_eq!(packet.len(), 26);
    assert_eq!(packet[0], OPCODE_SELF_MOVE_LOOK);
    // (32 + 83 + 64) / 32
    let y = 179.0f32 / 32.0;
    assert_eq!(read_f32(packet, 1).unwrap().to_bits(), 2.0f32.to_bits());
    assert_eq!(read_f32(packet, 5).unwrap().to_bits(), y.to_bits());
    assert_eq!(read_f32(packet, 9).unwrap().to_bits(), y.to_bits());
    assert_eq!(read_f32(packet, 13).unwrap().to_bits(), 3.0f32.to_bits());
    assert_eq!(read_f32(packet, 17).unwrap(), 90.0);
    assert_eq!(read_f32(packet, 21).unwrap(), 0.0);
    assert_eq!(packet[25], 1);
}

#[test]
fn test_spawn_and_teleport_other_entity() {
    let (session, _hooks, sink) = logged_in();
    let position = Position::new(100, 200, 300);
    let orientation = Orientation::new(200, 10);
    session
        .send_spawn_entity(3, "&cBob", "Bob", position, orientation)
        .unwrap();
    session
        .send_teleport(3, Position::new(101, 200, 300), orientation)
        .unwrap();

    let packets = sink.packets();
    assert_eq!(packets.len(), 2);

    let add = &packets[0];
    assert_eq!(add[0], OPCODE_NAMED_ADD);
    assert_eq!(read_i32(add, 1).unwrap(), 3);
    assert_eq!(raw_text(add, 5), "§cBob");
    let offset = 5 + 2 + 6;
    assert_eq!(read_i32(add, offset).unwrap(), 100);
    assert_eq!(read_i32(add, offset + 4).unwrap(), 200 - 19 + 64);
    assert_eq!(read_i32(add, offset + 8).unwrap(), 300);
    assert_eq!(add[offset + 12], 72);
    assert_eq!(add[offset + 13], 10);
    assert_eq!(add.len(), offset + 16);

    let teleport = &packets[1];
    assert_eq!(teleport.len(), 19);
    assert_eq!(teleport[0], OPCODE_TELEPORT);
    assert_eq!(read_i32(teleport, 5).unwrap(), 101);
    assert_eq!(read_i32(teleport, 9).unwrap(), 245);
    assert_eq!(teleport[17], 72);
}

#[test]
fn test_unsupported_features() {
    let (session, _hooks, sink) = logged_in();
    session.send_change_model(3, "chicken").unwrap();
    assert!(sink.packets().is_empty());

    let err = session.send_add_tab_entry(3, "Bob", "Bob", "Players", 0).unwrap_err();
    assert!(matches!(err, ProtocolError::UnimplementedCapability(_)));
    let err = session.send_remove_tab_entry(3).unwrap_err();
    assert!(matches!(err, ProtocolError::UnimplementedCapability(_)));
    assert!(session.is_active());
}

#[test]
fn test_kick_sends_nothing() {
    let (session, hooks, sink) = logged_in();
    session.kick("Bye");
    assert!(sink.packets().is_empty());
    assert!(sink.is_closed());
    assert_eq!(hooks.events().last().unwrap(), "left Bye");
}

#[test]
fn test_level_transfer() {
    let (width, height, length) = (4u16, 6u16, 3u16);
    let volume = width as usize * height as usize * length as usize;
    let layer = width as usize * length as usize;
    let mut blocks = vec![AIR; volume];
    let mut metadata = vec![0u8; volume];
    blocks[0] = STONE;
    metadata[0] = 5;
    // top layer, cut off by the shift
    blocks[volume - 1] = COBBLESTONE;
    let mut level = LevelSnapshot::new(width, height, length, blocks, metadata).unwrap();
    level.spawn = Position::from_block(1, 2, 1);

    let (session, _hooks, sink) = logged_in();
    session.send_level(Arc::new(level)).unwrap();

    let packets = sink.packets();
    assert_eq!(packets.len(), 3);
    assert_eq!(packets[0][0], OPCODE_PRE_CHUNK);
    assert_eq!(packets[1][0], OPCODE_CHUNK);
    assert_eq!(packets[2][0], OPCODE_SPAWN_POSITION);

    let header = &packets[0];
    let blocks_len = read_i32(header, 1).unwrap() as usize;
    let meta_len = read_i32(header, 5).unwrap() as usize;
    assert_eq!(read_i32(header, 9).unwrap(), LEVEL_HEADER_CONSTANT);
    assert_eq!(read_i32(header, 13).unwrap() as usize, blocks_len);
    let blocks = decompress_with_length(&header[17..17 + blocks_len]).unwrap();
    let offset = 17 + blocks_len;
    assert_eq!(read_i32(header, offset).unwrap() as usize, meta_len);
    let meta = decompress_with_length(&header[offset + 4..offset + 4 + meta_len]).unwrap();
    assert_eq!(header.len(), offset + 4 + meta_len);

    assert_eq!(blocks.len(), volume);
    assert!(blocks[..2 * layer].iter().all(|b| *b == 0));
    assert_eq!(blocks[2 * layer], STONE as u8);
    assert!(!blocks.contains(&(COBBLESTONE as u8)));
    assert_eq!(meta[2 * layer], 5);

    let dims = &packets[1];
    assert_eq!(dims.len(), 21);
    assert_eq!(dims[1], 1);
    assert_eq!(read_i32(dims, 5).unwrap(), 4);
    assert_eq!(read_i32(dims, 9).unwrap(), 6);
    assert_eq!(read_i32(dims, 13).unwrap(), 3);

    let spawn = &packets[2];
    assert_eq!(read_i32(spawn, 1).unwrap(), 1);
    assert_eq!(read_i32(spawn, 5).unwrap(), 4);
    assert_eq!(read_i32(spawn, 9).unwrap(), 1);
}

#[test]
fn test_wire_position_scale() {
    assert_eq!(wire_to_position(0.0, 0.40625, 0.0), Position::new(0, 0, 0));
}

#[test]
fn test_huge_client_position_does_not_overflow() {
    let (session, _hooks, sink) = logged_in();
    let mut buf = BytesMut::new();
    buf.put_u8(OPCODE_SELF_MOVE);
    write_f32(&mut buf, 1.0);
    write_f32(&mut buf, 1.0e30);
    write_f32(&mut buf, 1.0e30);
    write_f32(&mut buf, 1.0);
    buf.put_u8(0);
    session.receive(&mut buf).unwrap();
    assert_eq!(session.position().y, i32::MAX);

    let (position, orientation) = (session.position(), session.orientation());
    session.send_teleport(3, position, orientation).unwrap();
    session.send_teleport(SELF_ID, position, orientation).unwrap();
    let packets = sink.take();
    assert_eq!(packets.len(), 2);
    assert_eq!(
        read_i32(&packets[0], 5).unwrap(),
        i32::MAX.wrapping_add(ENTITY_Y_OFFSET + WORLD_SHIFT_COORDS)
    );
    assert_eq!(packets[1].len(), 26);
}
