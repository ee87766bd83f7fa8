use crate::hooks::ServerHooks;
use crate::state::ServerState;
use anyhow::Result;
use cobble_protocol_core::{spawn_writer, ConnectionReader, Session, StandardBlocks};
use cobble_protocol_indev::IndevCodec;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Handle a single client connection from accept to disconnect.
/// Outbound packets go through a dedicated writer task; this task only reads.
pub async fn handle_connection(stream: TcpStream, state: Arc<ServerState>) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".into());
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for {}: {}", peer, e);
    }
    let (read_half, write_half) = stream.into_split();
    let (sink, _writer) = spawn_writer(write_half);

    let session = Arc::new(Session::new(
        state.next_session_id(),
        Arc::new(IndevCodec::new()),
        Arc::new(sink),
        Arc::new(ServerHooks::new(state.clone())),
        Arc::new(StandardBlocks),
    ));
    state.add_connection(session.clone());
    info!("Session {} opened from {}", session.id(), peer);

    let mut reader = ConnectionReader::new(read_half);
    if let Err(e) = read_loop(&session, &mut reader).await {
        debug!("Session {} ({}) ended: {}", session.id(), peer, e);
    }
    // No-op when the session already ended itself
    session.leave("Disconnected");
}

/// Feed received bytes to the session until it terminates or the peer hangs up.
async fn read_loop<R>(session: &Session, reader: &mut ConnectionReader<R>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    while !session.state().is_terminal() {
        reader.fill().await?;
        session.receive(reader.buffer())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use cobble_protocol_core::{write_i32, write_text, ConnectionState, MemorySink};
    use cobble_protocol_indev::{LOGIN_UNKNOWN_BYTES, OPCODE_LOGIN, PROTOCOL_VERSION};
    use cobble_world::generate_flat;
    use bytes::{BufMut, BytesMut};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_read_loop_until_hangup() {
        let config = Arc::new(ServerConfig::default());
        let state = Arc::new(ServerState::new(config, generate_flat("test", 8, 8, 8)));
        let session = Arc::new(Session::new(
            state.next_session_id(),
            Arc::new(IndevCodec::new()),
            Arc::new(MemorySink::new()),
            Arc::new(ServerHooks::new(state.clone())),
            Arc::new(StandardBlocks),
        ));
        state.add_connection(session.clone());

        let (client, server) = tokio::io::duplex(256);
        let mut reader = ConnectionReader::new(server);

        let mut login = BytesMut::new();
        login.put_u8(OPCODE_LOGIN);
        write_i32(&mut login, PROTOCOL_VERSION);
        write_text(&mut login, "Steve").unwrap();
        login.put_bytes(0, LOGIN_UNKNOWN_BYTES);
        write_text(&mut login, "").unwrap();
        write_text(&mut login, "").unwrap();

        let writer = tokio::spawn(async move {
            let mut client = client;
            // Trickle the packet in to exercise partial reads
            for chunk in login.chunks(3) {
                client.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let result = read_loop(&session, &mut reader).await;
        writer.await.unwrap();
        assert!(result.is_err());
        assert!(session.is_active());
        assert_eq!(state.player_count(), 1);

        session.leave("Disconnected");
        assert_eq!(session.state(), ConnectionState::Disconnecting);
        assert_eq!(state.player_count(), 0);
        assert_eq!(state.connection_count(), 0);
    }
}
